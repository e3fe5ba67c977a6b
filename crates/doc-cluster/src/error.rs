//! Error types for the clustering pipeline.

use thiserror::Error;

/// Run-terminating conditions surfaced to the caller.
///
/// Per-document and per-algorithm failures never show up here; they are
/// contained where they happen and recorded as [`crate::results::Diagnostic`]s.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// No readable document was found in the input directory.
    #[error("no documents found in {0}")]
    EmptyCorpus(String),

    /// The corpus is too small or too uniform to cluster.
    #[error("degenerate corpus: {0}")]
    DegenerateCorpus(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A clustering algorithm could not produce an assignment.
    #[error("{algorithm} failed: {reason}")]
    Algorithm {
        algorithm: &'static str,
        reason: String,
    },

    /// I/O error wrapper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serde serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClusterError {
    pub fn algorithm(algorithm: &'static str, reason: impl Into<String>) -> Self {
        ClusterError::Algorithm {
            algorithm,
            reason: reason.into(),
        }
    }

    /// True for the corpus-level conditions that stop a run before clustering.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, ClusterError::EmptyCorpus(_) | ClusterError::DegenerateCorpus(_))
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ClusterError>;
