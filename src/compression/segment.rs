//! Divide-and-conquer reduction for datasets too large to rank in one pass.
//!
//! With `S = num_sample` and `C = num_chunks`, the candidate list is cut into
//! contiguous chunks of `C·S` frames, each chunk keeps its top `S` frames by
//! coverage ranking, and the survivors are concatenated. Levels repeat until
//! at most `C·S` candidates remain, which are ranked once more and truncated
//! to `S`. Every level shrinks the candidate count by roughly a factor `C`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::frames::{frame_descriptors_and_entropies, CompressionParams};
use super::msc::msc_ranking;
use super::check_frames;
use crate::descriptor::DescriptorExtractor;
use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;
use crate::parallel::with_jobs;

/// Settings for [`segment_compress`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Frames kept per chunk, and in the final selection.
    pub num_sample: usize,
    /// Chunk size as a multiple of `num_sample` (at least 2).
    pub num_chunks: usize,
    pub compression: CompressionParams,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            num_sample: 1000,
            num_chunks: 10,
            compression: CompressionParams::default(),
        }
    }
}

/// Reduce `frames` to at most `num_sample` indices.
///
/// Returns `0..N` unchanged when `N ≤ num_sample`. Otherwise the result is
/// in coverage-rank order of the final level. Fails with
/// [`EntropyError::NonShrinkingReduction`] when `num_sample == 0` or
/// `num_chunks < 2`.
pub fn process_dataset(
    frames: &[Matrix],
    entropies: &[f64],
    num_chunks: usize,
    num_sample: usize,
    h: f64,
    entropy_weight: f64,
) -> Result<Vec<usize>> {
    check_frames(frames.len(), entropies)?;
    if num_sample == 0 {
        return Err(EntropyError::NonShrinkingReduction(
            "num_sample must be at least 1".to_string(),
        ));
    }
    if num_chunks < 2 {
        return Err(EntropyError::NonShrinkingReduction(format!(
            "num_chunks must be at least 2, got {num_chunks}"
        )));
    }

    let chunk_len = num_chunks.saturating_mul(num_sample);
    let mut candidates: Vec<usize> = (0..frames.len()).collect();
    let mut level = 0usize;

    loop {
        let n = candidates.len();
        if n <= num_sample {
            return Ok(candidates);
        }
        if n <= chunk_len {
            info!(level, candidates = n, keep = num_sample, "final ranking");
            return rank_subset(frames, entropies, &candidates, h, entropy_weight, num_sample);
        }

        let reduced: Vec<Vec<usize>> = candidates
            .par_chunks(chunk_len)
            .map(|chunk| rank_subset(frames, entropies, chunk, h, entropy_weight, num_sample))
            .collect::<Result<_>>()?;
        let next: Vec<usize> = reduced.into_iter().flatten().collect();

        if next.len() >= n {
            return Err(EntropyError::NonShrinkingReduction(format!(
                "level {level} kept {} of {n} candidates",
                next.len()
            )));
        }
        info!(level, before = n, after = next.len(), "chunked reduction");
        candidates = next;
        level += 1;
    }
}

/// Rank the frames named by `subset` and map the top `keep` back to global indices.
fn rank_subset(
    frames: &[Matrix],
    entropies: &[f64],
    subset: &[usize],
    h: f64,
    entropy_weight: f64,
    keep: usize,
) -> Result<Vec<usize>> {
    let refs: Vec<&Matrix> = subset.iter().map(|&i| &frames[i]).collect();
    let local_entropies: Vec<f64> = subset.iter().map(|&i| entropies[i]).collect();
    let ranking = msc_ranking(&refs, &local_entropies, h, entropy_weight, Some(keep))?;
    Ok(ranking.into_iter().map(|i| subset[i]).collect())
}

/// Extract descriptors and entropies for `dataset`, then [`process_dataset`].
pub fn segment_compress<F, E>(
    dataset: &[F],
    extractor: &E,
    params: &SegmentParams,
) -> Result<Vec<usize>>
where
    F: Sync,
    E: DescriptorExtractor<F> + ?Sized,
{
    let data = frame_descriptors_and_entropies(dataset, extractor, &params.compression)?;
    let compression = &params.compression;
    with_jobs(compression.jobs, || {
        process_dataset(
            &data.descriptors,
            &data.entropies,
            params.num_chunks,
            params.num_sample,
            compression.bandwidth,
            compression.entropy_weight,
        )
    })?
}
