// crates/doc-cluster/src/server.rs

//! Read-only HTTP service for browsing the dataset directory.
//!
//! Documents are listed and served through the same loader and extension
//! filter as a clustering run.

use axum::{
    extract::{Path as UrlPath, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::ClusterError;

#[derive(Debug, Clone)]
pub struct DatasetState {
    dataset_dir: Arc<PathBuf>,
    extensions: Arc<Vec<String>>,
}

impl DatasetState {
    pub fn new(dataset_dir: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            dataset_dir: Arc::new(dataset_dir.into()),
            extensions: Arc::new(extensions),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dataset_dir.clone(), config.file_extensions.clone())
    }

    /// `None` when the directory exists but holds no loadable document.
    fn load(&self) -> crate::Result<Option<Corpus>> {
        if !self.dataset_dir.is_dir() {
            return Err(ClusterError::EmptyCorpus(format!(
                "{} (directory not found)",
                self.dataset_dir.display()
            )));
        }
        match Corpus::load_dir(&self.dataset_dir, &self.extensions) {
            Ok(corpus) => Ok(Some(corpus)),
            Err(ClusterError::EmptyCorpus(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// One entry of `GET /documents`.
#[derive(Debug, Serialize)]
pub struct DocumentEntry {
    pub name: String,
    /// UTF-8 length of the text as the pipeline reads it.
    pub size: usize,
    pub extension: Option<String>,
}

/// One entry of `GET /files-info`, relative to the dataset directory.
#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub extension: Option<String>,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ClusterError> for ApiError {
    fn from(e: ClusterError) -> Self {
        Self::internal(format!("Unable to scan directory: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}", self.message);
        }
        (self.status, self.message).into_response()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
}

async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("worker failed: {}", e)))?
        .map_err(ApiError::from)
}

async fn list_documents(State(state): State<DatasetState>) -> Result<Json<Vec<DocumentEntry>>, ApiError> {
    let corpus = blocking(move || state.load()).await?;
    let entries = corpus
        .map(|corpus| {
            corpus
                .into_documents()
                .into_iter()
                .map(|doc| DocumentEntry {
                    extension: extension_of(Path::new(&doc.filename)),
                    size: doc.text.len(),
                    name: doc.filename,
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(Json(entries))
}

async fn get_document(
    State(state): State<DatasetState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, ApiError> {
    let corpus = blocking(move || state.load()).await?;
    let text = corpus
        .as_ref()
        .and_then(|corpus| corpus.get(&filename))
        .map(|doc| doc.text.clone())
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response())
}

async fn files_info(State(state): State<DatasetState>) -> Result<Json<Vec<FileInfo>>, ApiError> {
    let root = state.dataset_dir.clone();
    let files = blocking(move || {
        let mut files = Vec::new();
        walk(&root, &root, &mut files)?;
        Ok(files)
    })
    .await?;
    Ok(Json(files))
}

/// Every regular file below `dir`, depth first in name order.
fn walk(root: &Path, dir: &Path, out: &mut Vec<FileInfo>) -> crate::Result<()> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    paths.sort();

    for path in paths {
        let metadata = fs::metadata(&path)?;
        if metadata.is_dir() {
            walk(root, &path, out)?;
            continue;
        }
        out.push(FileInfo {
            path: path
                .strip_prefix(root)
                .unwrap_or(path.as_path())
                .to_string_lossy()
                .replace('\\', "/"),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            size: metadata.len(),
            extension: extension_of(&path),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        });
    }
    Ok(())
}

pub fn router(state: DatasetState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/documents", get(list_documents))
        .route("/documents/:filename", get(get_document))
        .route("/files-info", get(files_info))
        .route("/healthz", get(|| async { "OK" }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the dataset directory of `config` until the process is stopped.
pub async fn serve(config: &Config, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Serving {} on http://{}",
        config.dataset_dir.display(),
        listener.local_addr()?
    );
    axum::serve(listener, router(DatasetState::from_config(config))).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn dataset() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b_finance.txt"), "Stock prices fell.").unwrap();
        fs::write(dir.path().join("a_pets.md"), "Cats and dogs.").unwrap();
        fs::write(dir.path().join(".hidden"), "skip").unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();
        fs::write(dir.path().join("archive").join("old.txt"), "old news").unwrap();
        dir
    }

    fn app(dir: &Path) -> Router {
        router(DatasetState::new(dir, Vec::new()))
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_lists_the_documents_the_pipeline_loads() {
        let dir = dataset();
        let (status, body) = fetch(app(dir.path()), "/documents").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let names: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a_pets.md", "b_finance.txt"]);
        assert_eq!(json[0]["extension"], "md");
        assert_eq!(json[1]["size"], 18);
    }

    #[tokio::test]
    async fn test_extension_filter_applies() {
        let dir = dataset();
        let app = router(DatasetState::new(dir.path(), vec!["txt".to_string()]));
        let (_, body) = fetch(app.clone(), "/documents").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (status, _) = fetch(app, "/documents/a_pets.md").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_document_text() {
        let dir = dataset();
        let (status, body) = fetch(app(dir.path()), "/documents/a_pets.md").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Cats and dogs.");
    }

    #[tokio::test]
    async fn test_unknown_or_outside_files_are_not_found() {
        let dir = dataset();
        let app = app(dir.path());
        assert_eq!(fetch(app.clone(), "/documents/missing.txt").await.0, StatusCode::NOT_FOUND);
        assert_eq!(fetch(app.clone(), "/documents/.hidden").await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            fetch(app, "/documents/..%2F..%2Fetc%2Fpasswd").await.0,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_files_info_walks_subdirectories() {
        let dir = dataset();
        let (status, body) = fetch(app(dir.path()), "/files-info").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let paths: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].as_str().unwrap())
            .collect();
        assert!(paths.contains(&"archive/old.txt"));
        assert!(paths.contains(&"b_finance.txt"));
        let old = json.as_array().unwrap().iter().find(|e| e["name"] == "old.txt").unwrap();
        assert_eq!(old["size"], 8);
        assert!(old["modified"].is_string());
    }

    #[tokio::test]
    async fn test_empty_and_missing_directories() {
        let dir = tempdir().unwrap();
        let (status, body) = fetch(app(dir.path()), "/documents").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]");

        let missing = dir.path().join("missing");
        assert_eq!(
            fetch(app(&missing), "/documents").await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            fetch(app(&missing), "/files-info").await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
