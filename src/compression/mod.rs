//! Entropy-driven dataset compression.
//!
//! A dataset is a sequence of frames, each reduced to a descriptor matrix by a
//! [`DescriptorExtractor`]. Frames are ranked so that every prefix of the
//! ranking is as diverse as possible, and a prefix of the ranking is kept.
//!
//! # Strategies
//!
//! | Strategy | Criterion | Cost |
//! |----------|-----------|------|
//! | [`RankingStrategy::Fps`] | farthest mean descriptor | `O(N²·d)` |
//! | [`RankingStrategy::Msc`] | least covered descriptors, plus entropy | `O(N·D·m·d)` |
//!
//! For datasets too large for one coverage ranking, [`process_dataset`]
//! reduces chunk by chunk.
//!
//! # Usage
//!
//! ```rust
//! use kdentropy::compression::{compress_dataset, Compression, CompressionParams, RankingStrategy};
//! use kdentropy::descriptor::precomputed;
//! use kdentropy::Matrix;
//!
//! let frames: Vec<Matrix> = (0..10)
//!     .map(|i| Matrix::from_rows(&[vec![i as f64, 0.0], vec![i as f64, 0.5]]).unwrap())
//!     .collect();
//!
//! let result = compress_dataset(
//!     &frames,
//!     &precomputed,
//!     RankingStrategy::Fps,
//!     Compression::Fraction(0.5),
//!     &CompressionParams::default(),
//! )
//! .unwrap();
//! assert_eq!(result.selected.len(), 5);
//! ```

mod baseline;
mod fps;
mod frames;
mod msc;
mod optimizer;
mod segment;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use baseline::{
    BaselineKind, DbscanSample, KMeansSample, MeanFarthestPoint, RandomSample, SelectionStrategy,
};
pub use fps::{farthest_point_order, farthest_point_ranking};
pub use frames::{frame_descriptors_and_entropies, CompressionParams, FrameData};
pub use msc::{minimum_set_coverage, COVERAGE_EPS};
pub use optimizer::{BoundedOptimizer, GoldenSectionSearch, Optimum};
pub use segment::{process_dataset, segment_compress, SegmentParams};

use crate::descriptor::DescriptorExtractor;
use crate::entropy::kernel_sum;
use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;
use crate::parallel::with_jobs;

/// Lower bound of the fraction searched by [`Compression::Optimize`].
pub const MIN_OPTIMIZED_FRACTION: f64 = 0.1;

/// How frames are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingStrategy {
    /// Farthest-point sampling on mean descriptors.
    Fps,
    /// Entropy-weighted minimum set coverage.
    #[default]
    Msc,
}

impl FromStr for RankingStrategy {
    type Err = EntropyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fps" | "farthest_point" => Ok(RankingStrategy::Fps),
            "msc" | "minimum_set_coverage" => Ok(RankingStrategy::Msc),
            _ => Err(EntropyError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for RankingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingStrategy::Fps => f.write_str("fps"),
            RankingStrategy::Msc => f.write_str("msc"),
        }
    }
}

/// How much of the ranking to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compression {
    /// Keep the top `floor(N · f)` frames, `0 < f ≤ 1`.
    Fraction(f64),
    /// Search the fraction that maximizes `H · ln D` of the kept descriptors.
    Optimize,
}

/// Outcome of [`compress_dataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    /// Full ranking of every frame.
    pub ranking: Vec<usize>,
    /// Kept frames, a prefix of `ranking`.
    pub selected: Vec<usize>,
    /// Fraction of the ranking that was kept.
    pub fraction: f64,
}

/// Index of the largest value; the earliest wins ties and NaN never wins.
pub(crate) fn argmax_first(values: impl Iterator<Item = (usize, f64)>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values {
        if v.is_nan() {
            if best.is_none() {
                best = Some((i, f64::NEG_INFINITY));
            }
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

pub(crate) fn check_frames(n: usize, entropies: &[f64]) -> Result<()> {
    if entropies.len() != n {
        return Err(EntropyError::DimensionMismatch {
            expected: n,
            got: entropies.len(),
        });
    }
    Ok(())
}

/// One mean descriptor per frame, stacked.
///
/// Frames with no descriptors (including `0 × 0` ones) map to a zero vector
/// of the width of the first frame that has descriptors.
pub(crate) fn mean_descriptors(frames: &[Matrix]) -> Result<Matrix> {
    let width = frames
        .iter()
        .find(|f| !f.is_empty())
        .map_or(0, Matrix::cols);
    let means: Vec<Vec<f64>> = frames
        .iter()
        .map(|f| {
            if f.is_empty() {
                vec![0.0; width]
            } else {
                f.mean_row()
            }
        })
        .collect();
    Matrix::from_rows(&means)
}

/// Full ranking of precomputed frames.
pub fn rank(
    strategy: RankingStrategy,
    frames: &[Matrix],
    entropies: &[f64],
    params: &CompressionParams,
) -> Result<Vec<usize>> {
    match strategy {
        RankingStrategy::Fps => farthest_point_ranking(frames, entropies),
        RankingStrategy::Msc => {
            minimum_set_coverage(frames, entropies, params.bandwidth, params.entropy_weight, None)
        }
    }
}

/// Rank `dataset` and keep a prefix of the ranking.
///
/// [`Compression::Optimize`] uses [`GoldenSectionSearch::default`]; see
/// [`compress_dataset_with_optimizer`] to supply another optimizer.
pub fn compress_dataset<F, E>(
    dataset: &[F],
    extractor: &E,
    strategy: RankingStrategy,
    compression: Compression,
    params: &CompressionParams,
) -> Result<CompressionResult>
where
    F: Sync,
    E: DescriptorExtractor<F> + ?Sized,
{
    compress_dataset_with_optimizer(
        dataset,
        extractor,
        strategy,
        compression,
        params,
        &GoldenSectionSearch::default(),
    )
}

/// [`compress_dataset`] with an explicit fraction optimizer.
pub fn compress_dataset_with_optimizer<F, E>(
    dataset: &[F],
    extractor: &E,
    strategy: RankingStrategy,
    compression: Compression,
    params: &CompressionParams,
    optimizer: &dyn BoundedOptimizer,
) -> Result<CompressionResult>
where
    F: Sync,
    E: DescriptorExtractor<F> + ?Sized,
{
    if let Compression::Fraction(f) = compression {
        if !(f > 0.0 && f <= 1.0) {
            return Err(EntropyError::InvalidParameter(format!(
                "compression fraction must be in (0, 1], got {f}"
            )));
        }
    }

    let data = frame_descriptors_and_entropies(dataset, extractor, params)?;
    let ranking = with_jobs(params.jobs, || {
        rank(strategy, &data.descriptors, &data.entropies, params)
    })??;
    let n = ranking.len();

    let (count, fraction) = match compression {
        Compression::Fraction(f) => ((n as f64 * f).floor() as usize, f),
        Compression::Optimize if n == 0 => (0, 0.0),
        Compression::Optimize => {
            let mut cost = PrefixCost::new(&data.descriptors, &ranking, params);
            let best = optimizer.maximize(
                &mut |x: f64| cost.at_fraction(x),
                MIN_OPTIMIZED_FRACTION,
                1.0,
            )?;
            info!(
                fraction = best.x,
                objective = best.value,
                evaluations = best.evaluations,
                "optimized compression fraction"
            );
            (prefix_len(n, best.x), best.x)
        }
    };

    let selected = ranking[..count.min(n)].to_vec();
    info!(%strategy, frames = n, kept = selected.len(), "dataset compressed");
    Ok(CompressionResult {
        ranking,
        selected,
        fraction,
    })
}

fn prefix_len(n: usize, x: f64) -> usize {
    ((n as f64 * x).floor() as usize).clamp(1, n)
}

/// `H · ln D` of the descriptors of a ranking prefix, memoized by prefix length.
struct PrefixCost<'a> {
    frames: &'a [Matrix],
    ranking: &'a [usize],
    params: &'a CompressionParams,
    cache: HashMap<usize, f64>,
}

impl<'a> PrefixCost<'a> {
    fn new(frames: &'a [Matrix], ranking: &'a [usize], params: &'a CompressionParams) -> Self {
        Self {
            frames,
            ranking,
            params,
            cache: HashMap::new(),
        }
    }

    fn at_fraction(&mut self, x: f64) -> Result<f64> {
        let count = prefix_len(self.ranking.len(), x);
        if let Some(&v) = self.cache.get(&count) {
            return Ok(v);
        }
        let kept = Matrix::concat_rows(self.ranking[..count].iter().map(|&i| &self.frames[i]))?;
        let value =
            entropy_diversity_objective(&kept, self.params.bandwidth, self.params.batch_size)?;
        self.cache.insert(count, value);
        Ok(value)
    }
}

/// `perfect_entropy(x) · ln(diversity(x))`, sharing one kernel-sum pass.
///
/// An empty set scores `-inf`.
fn entropy_diversity_objective(x: &Matrix, h: f64, batch_size: usize) -> Result<f64> {
    if x.is_empty() {
        return Ok(f64::NEG_INFINITY);
    }
    let n = x.rows() as f64;
    let p = kernel_sum(x, x, h, batch_size)?;
    let entropy = -p.iter().map(|&v| (v / n).ln()).sum::<f64>() / n;
    let diversity: f64 = p.iter().map(|&v| 1.0 / v).sum();
    Ok(entropy * diversity.ln())
}
