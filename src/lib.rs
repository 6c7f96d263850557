//! kdentropy: kernel-density entropy of descriptor sets, and entropy-driven
//! dataset compression.
//!
//! Organized leaves first:
//!
//! - `matrix`, `simd`, `distance`: dense `f64` rows and the distance kernels
//! - `neighbors`: k-nearest-neighbor providers (ball tree, brute force)
//! - `entropy`: the KDE estimator, plus exact all-pairs entropy and diversity
//! - `compression`: frame ranking (farthest point, minimum set coverage),
//!   chunked reduction, fraction search and baseline selectors
//! - `sampling`: repeated-subsample entropy and its JSON report
//!
//! # Critical Nuances
//!
//! ## Bandwidth Is the Resolution
//!
//! Two descriptors closer than a few `h` count as the same sample. Entropy is
//! only comparable between datasets at the same bandwidth, and the default
//! (`0.015`) assumes descriptors normalized to roughly unit scale.
//!
//! **Practical impact**: as `h → 0` every distinct point is resolved and the
//! entropy of `n` points saturates at `ln n`; a bandwidth wider than the
//! clusters of the data collapses each cluster into one sample.
//!
//! ## Truncated Neighbor Sums
//!
//! The estimator sums the kernel over the `nbrs` nearest reference points
//! only. With the Gaussian kernel the dropped terms are below
//! `exp(−r²/2h²)` for the `nbrs`-th distance `r`, which is negligible once
//! `r` is a few bandwidths. When it is not, raise `nbrs` or use
//! [`entropy::perfect_entropy`].
//!
//! ## Descriptors Come From Outside
//!
//! The crate never looks inside a frame. A [`DescriptorExtractor`] maps each
//! frame to a descriptor matrix; for precomputed descriptors use
//! [`descriptor::precomputed`].
//!
//! # Usage
//!
//! ```rust
//! use kdentropy::{EntropyEstimator, EstimatorParams, Matrix};
//!
//! let x = Matrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
//! let params = EstimatorParams { nbrs: 3, ..EstimatorParams::default() };
//! let estimator = EntropyEstimator::new(x, params).unwrap();
//! let h = estimator.dataset_entropy().unwrap();
//! assert!((h - 3f64.ln()).abs() < 1e-9);
//! ```

pub mod compression;
pub mod descriptor;
pub mod distance;
pub mod entropy;
pub mod error;
pub mod matrix;
pub mod neighbors;
pub mod parallel;
pub mod partitioning;
pub mod sampling;
pub mod simd;

// Re-exports
pub use compression::{
    compress_dataset, process_dataset, segment_compress, Compression, CompressionParams,
    CompressionResult, RankingStrategy, SegmentParams,
};
pub use descriptor::{DescriptorConfig, DescriptorExtractor};
pub use distance::Metric;
pub use entropy::{EntropyEstimator, EstimatorParams, Kernel};
pub use error::{EntropyError, Result};
pub use matrix::Matrix;
pub use neighbors::{NeighborProvider, ProviderKind};
pub use sampling::{resample_entropy, EntropyReport, SamplerParams};
