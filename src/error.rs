//! Error types for kdentropy.

use thiserror::Error;

/// Errors raised by the estimator, the neighbor providers and the
/// compression engine.
///
/// Everything except [`EntropyError::SingularMatrix`], [`EntropyError::Descriptor`],
/// [`EntropyError::Json`] and [`EntropyError::Io`] is a configuration error: it is reported before
/// any numeric work starts and retrying with the same inputs fails again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntropyError {
    /// Kernel name not recognized.
    #[error("unknown kernel: {0}")]
    UnknownKernel(String),

    /// Nearest-neighbor provider name not recognized.
    #[error("unknown neighbor provider: {0}")]
    UnknownProvider(String),

    /// Distance metric name not recognized.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    /// Ranking strategy name not recognized.
    #[error("unknown ranking strategy: {0} (expected \"fps\" or \"msc\")")]
    UnknownStrategy(String),

    /// Baseline selection strategy name not recognized.
    #[error("unknown baseline strategy: {0}")]
    UnknownBaseline(String),

    /// Bandwidth must be strictly positive and finite.
    #[error("bandwidth must be > 0, got {0}")]
    InvalidBandwidth(f64),

    /// More neighbors requested than reference points available.
    #[error("neighbor count {k} exceeds reference set size {n}")]
    TooManyNeighbors { k: usize, n: usize },

    /// Reference set has no rows.
    #[error("reference set is empty")]
    EmptyReference,

    /// Two matrices (or vectors) disagree on their width.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Chunked reduction cannot shrink the candidate set.
    #[error("chunked reduction does not shrink: {0}")]
    NonShrinkingReduction(String),

    /// Matrix determinant is (numerically) zero.
    #[error("singular matrix: |det| = {0:e}")]
    SingularMatrix(f64),

    /// The external descriptor extractor failed.
    #[error("descriptor extraction failed: {0}")]
    Descriptor(String),

    /// Report serialization failed.
    #[error("json error: {0}")]
    Json(String),

    /// I/O error while writing a report.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for EntropyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<std::io::Error> for EntropyError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EntropyError>;
