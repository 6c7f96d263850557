//! Exact (all-pairs) Gaussian KDE quantities.
//!
//! No neighbor truncation: every reference point contributes. Distances are
//! formed block by block, at most `batch_size × batch_size` at a time, so
//! peak memory stays bounded for large sets.
//!
//! With `p_i = Σ_j exp(−‖x_i − x_j‖² / 2h²)`:
//!
//! ```text
//! H(X) = −(1/n) Σ_i ln(p_i / n)        (perfect_entropy, nats)
//! D(X) = Σ_i 1 / p_i                  (diversity)
//! ```
//!
//! `D` counts each point with weight `1 / (its local multiplicity)`, so `n`
//! well-separated points give `D ≈ n` and `n` copies of one point give `D = 1`.

use super::check_bandwidth;
use crate::error::{EntropyError, Result};
use crate::matrix::{pairwise_distances, Matrix};

/// Default number of rows per distance block.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Gaussian kernel sums: for each row of `x`, `Σ_j exp(−‖x_i − y_j‖² / 2h²)` over `y`.
pub fn kernel_sum(x: &Matrix, y: &Matrix, h: f64, batch_size: usize) -> Result<Vec<f64>> {
    check_bandwidth(h)?;
    if batch_size == 0 {
        return Err(EntropyError::InvalidParameter(
            "batch_size must be greater than 0".to_string(),
        ));
    }

    let scale = 1.0 / (2.0 * h * h);
    let mut sums = vec![0.0; x.rows()];

    let mut xs = 0;
    while xs < x.rows() {
        let xe = (xs + batch_size).min(x.rows());
        let xb = x.slice_rows(xs, xe);

        let mut ys = 0;
        while ys < y.rows() {
            let ye = (ys + batch_size).min(y.rows());
            let d = pairwise_distances(&xb, &y.slice_rows(ys, ye))?;
            for (i, row) in d.iter_rows().enumerate() {
                sums[xs + i] += row.iter().map(|&v| (-(v * v) * scale).exp()).sum::<f64>();
            }
            ys = ye;
        }
        xs = xe;
    }

    Ok(sums)
}

/// Exact Gaussian KDE entropy of `x` against itself, in nats.
pub fn perfect_entropy(x: &Matrix, h: f64, batch_size: usize) -> Result<f64> {
    if x.is_empty() {
        return Err(EntropyError::EmptyReference);
    }
    let n = x.rows() as f64;
    let p = kernel_sum(x, x, h, batch_size)?;
    let mean_log = p.iter().map(|&v| (v / n).ln()).sum::<f64>() / n;
    Ok(-mean_log)
}

/// Effective number of distinct samples in `x`.
pub fn diversity(x: &Matrix, h: f64, batch_size: usize) -> Result<f64> {
    if x.is_empty() {
        return Err(EntropyError::EmptyReference);
    }
    let p = kernel_sum(x, x, h, batch_size)?;
    Ok(p.iter().map(|&v| 1.0 / v).sum())
}

/// Exact pointwise entropy of every row of `y` against the reference `x`:
/// `−ln Σ_j exp(−‖y_i − x_j‖² / 2h²)`.
///
/// Rows of `y` with no numerical support in `x` come out as `+inf`.
pub fn exact_delta_entropy(y: &Matrix, x: &Matrix, h: f64, batch_size: usize) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(EntropyError::EmptyReference);
    }
    Ok(kernel_sum(y, x, h, batch_size)?
        .into_iter()
        .map(|v| -v.ln())
        .collect())
}
