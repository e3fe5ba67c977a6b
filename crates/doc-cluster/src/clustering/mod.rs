//! Clustering algorithms over the document-term matrix.
//!
//! Every algorithm takes the same dense feature matrix and returns one label
//! per row. Failures come back as [`ClusterError::Algorithm`] values so the
//! engine can decide on a fallback.
//!
//! [`ClusterError::Algorithm`]: crate::error::ClusterError::Algorithm

pub mod cocluster;
pub mod engine;
pub mod estimator;
pub mod hierarchical;
pub mod kmeans;
pub mod linalg;
pub mod metrics;

use ndarray::Array2;

use crate::error::Result;

pub use cocluster::{CoclusterModel, SpectralCoclustering};
pub use engine::{ClusteringEngine, EngineOutput};
pub use estimator::{ClusterCountEstimator, ClusterCountReport};
pub use hierarchical::WardClustering;
pub use kmeans::{KMeans, KMeansConfig, KMeansModel};
pub use metrics::{inertia, silhouette_score};

/// Common interface for hard clustering algorithms (one label per row).
pub trait Clustering: Send + Sync {
    /// Fit on `data` and return one label in `[0, n_clusters)` per row.
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>>;

    /// The configured number of clusters.
    fn n_clusters(&self) -> usize;

    fn name(&self) -> &'static str;
}
