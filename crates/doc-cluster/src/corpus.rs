//! Documents and the lenient directory loader

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ClusterError, Result};

/// One input document. `ordinal` is its position in the corpus and is the
/// index used by every matrix row and label array downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub ordinal: usize,
    pub filename: String,
    pub text: String,
}

/// Ordered, non-empty collection of documents.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Build a corpus from `(filename, text)` pairs, keeping their order.
    pub fn from_texts<I, S, T>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let documents: Vec<Document> = texts
            .into_iter()
            .enumerate()
            .map(|(ordinal, (filename, text))| Document {
                ordinal,
                filename: filename.into(),
                text: text.into(),
            })
            .collect();

        if documents.is_empty() {
            return Err(ClusterError::EmptyCorpus("in-memory corpus".to_string()));
        }
        Ok(Self { documents })
    }

    /// Read every regular file in `dir` as one document.
    ///
    /// Files are visited in filename order. Invalid UTF-8 is replaced rather
    /// than rejected, hidden files are skipped, and unreadable files are logged
    /// and skipped. When `extensions` is non-empty only matching files are read.
    pub fn load_dir(dir: &Path, extensions: &[String]) -> Result<Self> {
        if !dir.is_dir() {
            return Err(ClusterError::EmptyCorpus(format!(
                "{} (directory not found)",
                dir.display()
            )));
        }

        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable directory entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        let mut texts = Vec::with_capacity(entries.len());
        for path in entries {
            let Some(filename) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            if filename.starts_with('.') {
                debug!("Skipping hidden file {}", filename);
                continue;
            }
            if !Self::matches_extension(&path, extensions) {
                debug!("Skipping {} (extension filter)", filename);
                continue;
            }

            match fs::read(&path) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    texts.push((filename, text));
                }
                Err(e) => warn!("Error reading file {}: {}", filename, e),
            }
        }

        if texts.is_empty() {
            return Err(ClusterError::EmptyCorpus(dir.display().to_string()));
        }

        info!("Loaded {} documents from {}", texts.len(), dir.display());
        Self::from_texts(texts)
    }

    fn matches_extension(path: &Path, extensions: &[String]) -> bool {
        if extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Document with exactly this filename.
    pub fn get(&self, filename: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.filename == filename)
    }

    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}
