//! Cluster-count estimation with the curvature elbow.

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::kmeans::{KMeans, KMeansConfig};
use super::metrics::silhouette_score;
use crate::error::Result;
use crate::results::Diagnostic;

/// Inertia, silhouette if defined, and the reason it was not.
type CandidateFit = (f64, Option<f64>, Option<String>);

/// Fallback when the corpus is too small to compare candidates.
const MIN_K: usize = 2;

/// Inertia and silhouette curves over the candidate cluster counts, and the
/// count that was picked from them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterCountReport {
    pub candidates: Vec<usize>,
    pub inertia: Vec<f64>,
    pub silhouette: Vec<f64>,
    pub optimal_k: usize,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct ClusterCountEstimator {
    max_clusters: usize,
    kmeans: KMeansConfig,
}

impl ClusterCountEstimator {
    pub fn new(max_clusters: usize, kmeans: KMeansConfig) -> Self {
        Self {
            max_clusters,
            kmeans,
        }
    }

    /// Fit k-means for every k in `[2, min(max_clusters, n - 1)]` and pick k
    /// where the inertia curve bends hardest.
    pub fn estimate(&self, features: &Array2<f64>) -> Result<ClusterCountReport> {
        let n = features.nrows();
        let upper = self.max_clusters.min(n.saturating_sub(1));

        if upper < MIN_K {
            let message = format!(
                "{} documents is too few to compare cluster counts, using k={}",
                n, MIN_K
            );
            warn!("{}", message);
            return Ok(ClusterCountReport {
                candidates: Vec::new(),
                inertia: Vec::new(),
                silhouette: Vec::new(),
                optimal_k: MIN_K,
                diagnostics: vec![Diagnostic::new("estimator", message)],
            });
        }

        let candidates: Vec<usize> = (MIN_K..=upper).collect();
        let fits: Vec<Result<CandidateFit>> = candidates
            .par_iter()
            .map(|&k| -> Result<CandidateFit> {
                let model = KMeans::new(k, self.kmeans.clone()).fit(features)?;
                Ok(match silhouette_score(features, &model.labels) {
                    Ok(score) => (model.inertia, Some(score), None),
                    Err(e) => (model.inertia, None, Some(e.to_string())),
                })
            })
            .collect();

        let mut inertia = Vec::with_capacity(candidates.len());
        let mut silhouette = Vec::with_capacity(candidates.len());
        let mut diagnostics = Vec::new();
        for (&k, fit) in candidates.iter().zip(fits) {
            let (k_inertia, score, failure) = fit?;
            inertia.push(k_inertia);
            silhouette.push(score.unwrap_or(0.0));
            if let Some(reason) = failure {
                let message = format!("silhouette undefined for k={}: {}", k, reason);
                warn!("{}", message);
                diagnostics.push(Diagnostic::new("estimator", message));
            }
        }

        let optimal_k = elbow(&candidates, &inertia);
        info!(
            "Optimal number of clusters: {} (candidates {}..={})",
            optimal_k, MIN_K, upper
        );

        Ok(ClusterCountReport {
            candidates,
            inertia,
            silhouette,
            optimal_k,
            diagnostics,
        })
    }
}

/// `candidates[argmax |Δ² inertia| + 1]`; the first maximum wins.
fn elbow(candidates: &[usize], inertia: &[f64]) -> usize {
    if candidates.len() < 3 {
        return MIN_K;
    }
    let mut best = 0;
    let mut best_curvature = f64::NEG_INFINITY;
    for i in 0..inertia.len() - 2 {
        let curvature = (inertia[i + 2] - 2.0 * inertia[i + 1] + inertia[i]).abs();
        if curvature > best_curvature {
            best_curvature = curvature;
            best = i;
        }
    }
    candidates[best + 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_elbow_picks_sharpest_bend() {
        let candidates = vec![2, 3, 4, 5, 6];
        let inertia = vec![100.0, 40.0, 35.0, 32.0, 30.0];
        assert_eq!(elbow(&candidates, &inertia), 3);
    }

    #[test]
    fn test_elbow_needs_three_candidates() {
        assert_eq!(elbow(&[2, 3], &[10.0, 5.0]), 2);
        assert_eq!(elbow(&[2], &[10.0]), 2);
    }

    #[test]
    fn test_tiny_corpus_falls_back_to_two() {
        let features = array![[1.0, 0.0], [0.0, 1.0]];
        let report = ClusterCountEstimator::new(10, KMeansConfig::default())
            .estimate(&features)
            .unwrap();
        assert_eq!(report.optimal_k, 2);
        assert!(report.candidates.is_empty());
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_k_stays_below_document_count() {
        let features = array![
            [1.0, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.9, 0.1],
            [0.0, 0.0, 1.0],
            [0.1, 0.0, 0.9],
        ];
        let report = ClusterCountEstimator::new(10, KMeansConfig::default())
            .estimate(&features)
            .unwrap();
        assert_eq!(report.candidates, vec![2, 3, 4, 5]);
        assert_eq!(report.inertia.len(), 4);
        assert_eq!(report.silhouette.len(), 4);
        assert!(report.optimal_k >= 2 && report.optimal_k < 6);
    }
}
