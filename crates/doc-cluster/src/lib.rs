// crates/doc-cluster/src/lib.rs

pub mod chart;
pub mod clustering;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod output;
pub mod pipeline;
pub mod results;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod text;
pub mod thread_pool;

// Public API exports
pub use config::Config;
pub use corpus::{Corpus, Document};
pub use error::{ClusterError, Result};
pub use pipeline::{ClusteringPipeline, PipelineOutput, RunSummary};
pub use results::{ClusterProfile, ClusteringReport, Diagnostic, TermWeight};

pub use clustering::{
    ClusterCountEstimator, ClusterCountReport, Clustering, ClusteringEngine, KMeans, KMeansConfig,
    SpectralCoclustering, WardClustering,
};
pub use features::{FeatureMatrix, TfidfConfig, TfidfVectorizer};
pub use text::{EntityAnnotation, EntityExtractor, LanguageResources, RuleBasedEntityExtractor, TextNormalizer};
