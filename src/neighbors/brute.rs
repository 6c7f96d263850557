//! Exhaustive k-nearest distances.
//!
//! Forms the full query×reference distance block with
//! [`pairwise_distances`] and orders each row with [`argsort_rows`]. Query
//! rows are processed in blocks of `batch_size` to cap peak memory. Used as a
//! fallback for small reference sets and as ground truth for the tree.

use super::check_query;
use super::traits::NeighborProvider;
use crate::error::{EntropyError, Result};
use crate::matrix::{argsort_rows, pairwise_distances, Matrix};

/// Default number of query rows per distance block.
pub const DEFAULT_QUERY_BATCH: usize = 1024;

/// Brute-force neighbor provider.
pub struct BruteForce {
    reference: Matrix,
    batch_size: usize,
    built: bool,
}

impl BruteForce {
    pub fn new() -> Self {
        Self {
            reference: Matrix::default(),
            batch_size: DEFAULT_QUERY_BATCH,
            built: false,
        }
    }

    /// Set how many query rows are processed per distance block.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl Default for BruteForce {
    fn default() -> Self {
        Self::new()
    }
}

impl NeighborProvider for BruteForce {
    fn build(&mut self, reference: &Matrix) -> Result<()> {
        if reference.is_empty() {
            return Err(EntropyError::EmptyReference);
        }
        self.reference = reference.clone();
        self.built = true;
        Ok(())
    }

    fn query(&self, points: &Matrix, k: usize) -> Result<Matrix> {
        check_query(self.built, self.num_points(), self.dimension(), points, k)?;

        let mut out = Matrix::zeros(points.rows(), k);
        let mut start = 0;
        while start < points.rows() {
            let end = (start + self.batch_size).min(points.rows());
            let block = pairwise_distances(&points.slice_rows(start, end), &self.reference)?;
            for (offset, order) in argsort_rows(&block, None).into_iter().enumerate() {
                let row = out.row_mut(start + offset);
                for (slot, &j) in row.iter_mut().zip(order.iter()) {
                    *slot = block.get(offset, j);
                }
            }
            start = end;
        }
        Ok(out)
    }

    fn num_points(&self) -> usize {
        self.reference.rows()
    }

    fn dimension(&self) -> usize {
        self.reference.cols()
    }

    fn name(&self) -> &'static str {
        "brute"
    }
}
