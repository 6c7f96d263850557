//! Unified trait for k-nearest-distance providers.

use crate::error::Result;
use crate::matrix::Matrix;

/// A fixed reference set that answers k-nearest-distance queries.
///
/// Implementations are built once (`build`) and then queried any number of
/// times; the reference set is never mutated after `build`.
pub trait NeighborProvider: Send + Sync {
    /// One-time preprocessing of the reference set.
    fn build(&mut self, reference: &Matrix) -> Result<()>;

    /// Distances from every row of `points` to its `k` nearest reference
    /// rows, sorted ascending. Returns a `points.rows() × k` matrix.
    fn query(&self, points: &Matrix, k: usize) -> Result<Matrix>;

    /// Number of reference points.
    fn num_points(&self) -> usize;

    /// Width of the reference vectors.
    fn dimension(&self) -> usize;

    /// Provider statistics.
    fn stats(&self) -> ProviderStats {
        ProviderStats {
            num_points: self.num_points(),
            dimension: self.dimension(),
            algorithm: self.name().to_string(),
        }
    }

    /// Short backend name.
    fn name(&self) -> &'static str;
}

/// Statistics about a neighbor provider.
#[derive(Debug, Clone)]
pub struct ProviderStats {
    pub num_points: usize,
    pub dimension: usize,
    pub algorithm: String,
}
