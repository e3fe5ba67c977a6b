//! Runs the three clustering algorithms on one feature matrix.

use ndarray::Array2;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

use super::cocluster::SpectralCoclustering;
use super::hierarchical::WardClustering;
use super::kmeans::{KMeans, KMeansConfig, KMeansModel};
use super::Clustering;
use crate::error::Result;
use crate::results::Diagnostic;

/// Labels from every algorithm, index-aligned with the matrix rows.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub kmeans: KMeansModel,
    pub hierarchical: Vec<usize>,
    pub biclustering: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ClusteringEngine {
    kmeans: KMeansConfig,
    coclusterer: Option<Arc<dyn Clustering>>,
}

impl ClusteringEngine {
    pub fn new(kmeans: KMeansConfig) -> Self {
        Self {
            kmeans,
            coclusterer: None,
        }
    }

    /// Replace the spectral co-clusterer, e.g. with one tuned for a known k.
    pub fn with_coclusterer(mut self, coclusterer: Arc<dyn Clustering>) -> Self {
        self.coclusterer = Some(coclusterer);
        self
    }

    /// Cluster `features` into `k` groups with every algorithm.
    ///
    /// k-means is the primary assignment and its failure fails the run. The
    /// hierarchical and co-clustering results fall back to all-zero labels
    /// with a diagnostic.
    pub fn run(&self, features: &Array2<f64>, k: usize) -> Result<EngineOutput> {
        let n = features.nrows();
        info!("Clustering {} documents into {} clusters", n, k);

        let kmeans = KMeans::new(k, self.kmeans.clone());
        let ward = WardClustering::new(k);
        let default_cocluster: Arc<dyn Clustering> =
            Arc::new(SpectralCoclustering::new(k, self.kmeans.clone()));
        let cocluster = self.coclusterer.clone().unwrap_or(default_cocluster);

        let (kmeans_result, (ward_result, cocluster_result)) = rayon::join(
            || kmeans.fit(features),
            || {
                rayon::join(
                    || guarded(&ward, features),
                    || guarded(cocluster.as_ref(), features),
                )
            },
        );

        let kmeans = kmeans_result?;
        let mut diagnostics = Vec::new();
        let hierarchical = labels_or_fallback(ward_result, n, "hierarchical", &mut diagnostics);
        let biclustering = labels_or_fallback(cocluster_result, n, "biclustering", &mut diagnostics);

        Ok(EngineOutput {
            kmeans,
            hierarchical,
            biclustering,
            diagnostics,
        })
    }
}

/// Run one algorithm without letting a panic escape.
fn guarded(algorithm: &dyn Clustering, features: &Array2<f64>) -> std::result::Result<Vec<usize>, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| algorithm.fit_predict(features))) {
        Ok(Ok(labels)) => Ok(labels),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("{} panicked", algorithm.name())),
    }
}

fn labels_or_fallback(
    result: std::result::Result<Vec<usize>, String>,
    n: usize,
    stage: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<usize> {
    match result {
        Ok(labels) if labels.len() == n => labels,
        Ok(labels) => {
            let message = format!("{} returned {} labels for {} documents", stage, labels.len(), n);
            warn!("{}; using all-zero labels", message);
            diagnostics.push(Diagnostic::new(stage, message));
            vec![0; n]
        }
        Err(reason) => {
            warn!("Error in {} clustering: {}; using all-zero labels", stage, reason);
            diagnostics.push(Diagnostic::new(stage, reason));
            vec![0; n]
        }
    }
}
