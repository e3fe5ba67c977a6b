//! Merged clustering results.
//!
//! The aggregator only reshapes what earlier stages produced. The one real
//! computation is ranking vocabulary terms by k-means centroid weight.

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::clustering::EngineOutput;
use crate::text::EntityAnnotation;
use crate::thread_pool::ProcessedDocument;

/// Non-fatal event recorded during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

/// Highest-weighted centroid terms of one k-means cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub terms: Vec<TermWeight>,
}

impl ClusterProfile {
    pub fn term_names(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.term.clone()).collect()
    }
}

/// Everything one run produced, index-aligned on document ordinal.
#[derive(Debug, Clone)]
pub struct ClusteringReport {
    pub documents: Vec<String>,
    pub kmeans: Vec<usize>,
    pub hierarchical: Vec<usize>,
    pub biclustering: Vec<usize>,
    pub optimal_k: usize,
    pub profiles: Vec<ClusterProfile>,
    /// k-means cluster id to the filenames assigned to it.
    pub cluster_documents: BTreeMap<usize, Vec<String>>,
    pub entities: BTreeMap<String, EntityAnnotation>,
    pub diagnostics: Vec<Diagnostic>,
    pub generated_at: DateTime<Utc>,
}

impl ClusteringReport {
    /// Cluster id to top term names.
    pub fn top_terms(&self) -> BTreeMap<usize, Vec<String>> {
        self.profiles
            .iter()
            .map(|profile| (profile.cluster, profile.term_names()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ResultAggregator {
    top_n: usize,
}

impl ResultAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn aggregate(
        &self,
        documents: &[ProcessedDocument],
        vocabulary: &[String],
        optimal_k: usize,
        engine: EngineOutput,
        mut diagnostics: Vec<Diagnostic>,
    ) -> ClusteringReport {
        let filenames: Vec<String> = documents.iter().map(|d| d.filename.clone()).collect();
        let profiles = self.profiles(&engine.kmeans.centroids, vocabulary);

        let mut cluster_documents: BTreeMap<usize, Vec<String>> =
            (0..engine.kmeans.centroids.nrows()).map(|c| (c, Vec::new())).collect();
        for (filename, &label) in filenames.iter().zip(&engine.kmeans.labels) {
            cluster_documents.entry(label).or_default().push(filename.clone());
        }

        let entities = documents
            .iter()
            .map(|d| (d.filename.clone(), d.entities.clone()))
            .collect();

        diagnostics.extend(engine.diagnostics);

        ClusteringReport {
            documents: filenames,
            kmeans: engine.kmeans.labels,
            hierarchical: engine.hierarchical,
            biclustering: engine.biclustering,
            optimal_k,
            profiles,
            cluster_documents,
            entities,
            diagnostics,
            generated_at: Utc::now(),
        }
    }

    /// Top terms per centroid, weight descending, ties by vocabulary order.
    pub fn profiles(&self, centroids: &Array2<f64>, vocabulary: &[String]) -> Vec<ClusterProfile> {
        centroids
            .outer_iter()
            .enumerate()
            .map(|(cluster, centroid)| {
                let mut order: Vec<usize> = (0..vocabulary.len().min(centroid.len())).collect();
                order.sort_by(|&a, &b| centroid[b].total_cmp(&centroid[a]).then(a.cmp(&b)));
                let terms = order
                    .into_iter()
                    .take(self.top_n)
                    .map(|j| TermWeight {
                        term: vocabulary[j].clone(),
                        weight: centroid[j],
                    })
                    .collect();
                ClusterProfile { cluster, terms }
            })
            .collect()
    }
}
