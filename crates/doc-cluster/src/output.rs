// crates/doc-cluster/src/output.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chart::ChartData;
use crate::clustering::ClusterCountReport;
use crate::features::FeatureMatrix;
use crate::results::{ClusteringReport, Diagnostic};
use crate::text::EntityAnnotation;

pub const CLUSTERING_RESULTS_FILE: &str = "clustering_results.json";
pub const DOCUMENT_FEATURES_FILE: &str = "document_features.json";
pub const CLUSTER_DOCUMENTS_FILE: &str = "cluster_documents.json";
pub const CLUSTER_METRICS_FILE: &str = "cluster_metrics.json";
pub const CHART_DATA_FILE: &str = "chart_data.json";

#[derive(Serialize)]
struct ClusteringResultsRecord<'a> {
    documents: &'a [String],
    kmeans: &'a [usize],
    hierarchical: &'a [usize],
    biclustering: &'a [usize],
    top_terms: BTreeMap<usize, Vec<String>>,
    optimal_k: usize,
    diagnostics: &'a [Diagnostic],
    generated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct DocumentFeaturesRecord<'a> {
    features: Vec<Vec<f64>>,
    feature_names: &'a [String],
    entities: &'a BTreeMap<String, EntityAnnotation>,
}

/// Writes run results as pretty JSON into one output directory.
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every result file and return their paths.
    pub fn write_all(
        &self,
        report: &ClusteringReport,
        features: &FeatureMatrix,
        metrics: &ClusterCountReport,
        chart: Option<&ChartData>,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory {}", self.dir.display()))?;

        let results = ClusteringResultsRecord {
            documents: &report.documents,
            kmeans: &report.kmeans,
            hierarchical: &report.hierarchical,
            biclustering: &report.biclustering,
            top_terms: report.top_terms(),
            optimal_k: report.optimal_k,
            diagnostics: &report.diagnostics,
            generated_at: report.generated_at,
        };
        let document_features = DocumentFeaturesRecord {
            features: features.to_nested_vec(),
            feature_names: features.vocabulary(),
            entities: &report.entities,
        };

        let mut written = vec![
            self.write_json(CLUSTERING_RESULTS_FILE, &results)?,
            self.write_json(DOCUMENT_FEATURES_FILE, &document_features)?,
            self.write_json(CLUSTER_DOCUMENTS_FILE, &report.cluster_documents)?,
            self.write_json(CLUSTER_METRICS_FILE, metrics)?,
        ];
        if let Some(chart) = chart {
            written.push(self.write_json(CHART_DATA_FILE, chart)?);
        }

        info!("Wrote {} result files to {}", written.len(), self.dir.display());
        Ok(written)
    }

    fn write_json<T: ?Sized + Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let bytes = serde_json::to_vec_pretty(value)
            .with_context(|| format!("Failed to serialize {}", name))?;
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ClusterProfile, TermWeight};
    use ndarray::array;
    use tempfile::tempdir;

    fn report() -> ClusteringReport {
        let mut cluster_documents = BTreeMap::new();
        cluster_documents.insert(0, vec!["a.txt".to_string()]);
        cluster_documents.insert(1, vec!["b.txt".to_string()]);
        let mut entities = BTreeMap::new();
        entities.insert("a.txt".to_string(), EntityAnnotation::empty());
        entities.insert("b.txt".to_string(), EntityAnnotation::empty());

        ClusteringReport {
            documents: vec!["a.txt".into(), "b.txt".into()],
            kmeans: vec![0, 1],
            hierarchical: vec![0, 1],
            biclustering: vec![0, 0],
            optimal_k: 2,
            profiles: vec![ClusterProfile {
                cluster: 0,
                terms: vec![TermWeight {
                    term: "cat".into(),
                    weight: 1.0,
                }],
            }],
            cluster_documents,
            entities,
            diagnostics: vec![Diagnostic::new("biclustering", "fallback")],
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_writes_all_files() {
        let dir = tempdir().unwrap();
        let features = FeatureMatrix::new(
            array![[1.0, 0.0], [0.0, 1.0]],
            vec!["cat".into(), "stock".into()],
            vec![1.0, 1.0],
        )
        .unwrap();
        let metrics = ClusterCountReport {
            candidates: vec![],
            inertia: vec![],
            silhouette: vec![],
            optimal_k: 2,
            diagnostics: vec![],
        };

        let writer = OutputWriter::new(dir.path().join("out"));
        let written = writer.write_all(&report(), &features, &metrics, None).unwrap();
        assert_eq!(written.len(), 4);

        let raw = fs::read_to_string(dir.path().join("out").join(CLUSTERING_RESULTS_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["optimal_k"], 2);
        assert_eq!(json["kmeans"], serde_json::json!([0, 1]));
        assert_eq!(json["top_terms"]["0"], serde_json::json!(["cat"]));
        assert_eq!(json["diagnostics"][0]["stage"], "biclustering");

        let raw = fs::read_to_string(dir.path().join("out").join(DOCUMENT_FEATURES_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["feature_names"], serde_json::json!(["cat", "stock"]));
        assert_eq!(json["features"][1][1], 1.0);
        assert!(json["entities"]["a.txt"]["PERSON"].is_array());

        let raw = fs::read_to_string(dir.path().join("out").join(CLUSTER_DOCUMENTS_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["1"], serde_json::json!(["b.txt"]));
        assert!(!dir.path().join("out").join(CHART_DATA_FILE).exists());
    }
}
