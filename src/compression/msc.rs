//! Entropy-weighted minimum-set-coverage ranking.
//!
//! The entropy-aware analogue of farthest-point ranking. Every descriptor
//! `y` of a not-yet-ranked frame carries its Gaussian coverage by the
//! descriptors of the frames ranked so far:
//!
//! ```text
//! c(y) = Σ_{x ∈ selected} exp(−‖y − x‖² / 2h²)
//! ```
//!
//! A frame's novelty is the mean pointwise entropy of its descriptors
//! against that selection, and its score blends in its standalone entropy
//! `H_i` with weight `l`:
//!
//! ```text
//! novelty_i = mean_{y ∈ frame_i} −ln(c(y) + ε)
//! score_i   = novelty_i + l · H_i
//! ```
//!
//! The first pick is the frame with the highest standalone entropy; each
//! later pick maximizes `score_i` (ties to the lower index). Coverage is
//! accumulated incrementally, so ranking `S` of `N` frames costs
//! `O(S · D · m · d)` for `D` total descriptors and `m` descriptors per pick.

use rayon::prelude::*;

use super::{argmax_first, check_frames};
use crate::entropy::check_bandwidth;
use crate::error::Result;
use crate::matrix::{pairwise_distances, Matrix};

/// Floor inside the novelty logarithm; uncovered descriptors score `−ln ε`.
pub const COVERAGE_EPS: f64 = 1e-15;

/// Minimum-set-coverage ranking of `frames`.
///
/// Returns the top `limit` frames in rank order (the full permutation when
/// `limit` is `None`).
pub fn minimum_set_coverage(
    frames: &[Matrix],
    entropies: &[f64],
    h: f64,
    entropy_weight: f64,
    limit: Option<usize>,
) -> Result<Vec<usize>> {
    let refs: Vec<&Matrix> = frames.iter().collect();
    msc_ranking(&refs, entropies, h, entropy_weight, limit)
}

pub(crate) fn msc_ranking(
    frames: &[&Matrix],
    entropies: &[f64],
    h: f64,
    entropy_weight: f64,
    limit: Option<usize>,
) -> Result<Vec<usize>> {
    check_frames(frames.len(), entropies)?;
    check_bandwidth(h)?;

    let n = frames.len();
    let limit = limit.map_or(n, |l| l.min(n));
    let Some(first) = argmax_first(entropies.iter().copied().enumerate()) else {
        return Ok(Vec::new());
    };
    if limit == 0 {
        return Ok(Vec::new());
    }

    let scale = 1.0 / (2.0 * h * h);
    let mut coverage: Vec<Vec<f64>> = frames.iter().map(|f| vec![0.0; f.rows()]).collect();
    let mut taken = vec![false; n];
    let mut ranking = Vec::with_capacity(limit);

    let mut current = first;
    loop {
        ranking.push(current);
        taken[current] = true;
        if ranking.len() == limit {
            break;
        }

        let picked = frames[current];
        coverage
            .par_iter_mut()
            .enumerate()
            .filter(|(i, _)| !taken[*i])
            .try_for_each(|(i, cov)| -> Result<()> {
                if cov.is_empty() || picked.is_empty() {
                    return Ok(());
                }
                let d = pairwise_distances(frames[i], picked)?;
                for (c, row) in cov.iter_mut().zip(d.iter_rows()) {
                    *c += row.iter().map(|&v| (-(v * v) * scale).exp()).sum::<f64>();
                }
                Ok(())
            })?;

        let scores = (0..n).filter(|&i| !taken[i]).map(|i| {
            let cov = &coverage[i];
            let novelty = if cov.is_empty() {
                0.0
            } else {
                cov.iter().map(|&c| -(c + COVERAGE_EPS).ln()).sum::<f64>() / cov.len() as f64
            };
            (i, novelty + entropy_weight * entropies[i])
        });

        match argmax_first(scores) {
            Some(next) => current = next,
            None => break,
        }
    }

    Ok(ranking)
}
