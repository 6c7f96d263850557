//! Boundary to the descriptor extractor.
//!
//! Turning a raw frame (e.g. an atomic structure) into descriptor vectors is
//! done outside this crate. The compression engine only needs something that
//! maps a frame to a `rows × d` [`Matrix`], one row per local environment.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matrix::Matrix;

/// Default cutoff radius for the descriptor neighbor list.
pub const DEFAULT_CUTOFF: f64 = 5.0;

/// Default number of neighbors per descriptor.
pub const DEFAULT_DESCRIPTOR_K: usize = 32;

/// Settings forwarded to the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorConfig {
    /// Cutoff radius for the neighbor list.
    pub cutoff: f64,
    /// Cutoff radius for considering interactions.
    pub interaction_cutoff: f64,
    /// Number of neighbors per descriptor.
    pub k: usize,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            interaction_cutoff: DEFAULT_CUTOFF,
            k: DEFAULT_DESCRIPTOR_K,
        }
    }
}

/// Computes the descriptor matrix of one frame.
///
/// Implemented for any `Fn(&F, &DescriptorConfig) -> Result<Matrix> + Sync`,
/// so closures and plain functions can be passed directly. Extraction runs on
/// worker threads, one frame per call.
pub trait DescriptorExtractor<F>: Sync {
    fn descriptors(&self, frame: &F, config: &DescriptorConfig) -> Result<Matrix>;
}

impl<F, G> DescriptorExtractor<F> for G
where
    G: Fn(&F, &DescriptorConfig) -> Result<Matrix> + Sync,
{
    fn descriptors(&self, frame: &F, config: &DescriptorConfig) -> Result<Matrix> {
        self(frame, config)
    }
}

/// Extractor for frames whose descriptors are already computed.
pub fn precomputed(frame: &Matrix, _config: &DescriptorConfig) -> Result<Matrix> {
    Ok(frame.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_and_functions_are_extractors() {
        fn run<E: DescriptorExtractor<Matrix>>(e: &E, m: &Matrix) -> Matrix {
            e.descriptors(m, &DescriptorConfig::default()).unwrap()
        }

        let m = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert_eq!(run(&precomputed, &m), m);

        let doubled =
            |f: &Matrix, _: &DescriptorConfig| -> Result<Matrix> { Ok(f.map(|v| 2.0 * v)) };
        assert_eq!(run(&doubled, &m).row(0), &[2.0, 4.0]);
    }
}
