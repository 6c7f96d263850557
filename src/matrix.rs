//! Dense matrices and the numeric primitives the estimator is built on.
//!
//! Matrices are stored row-major in a single flat buffer (one descriptor
//! vector per row), the same SoA layout the neighbor indexes use.
//!
//! # Precision notes
//!
//! - [`pairwise_distances`] expands `‖a−b‖² = ‖a‖² + ‖b‖² − 2⟨a,b⟩`. Catastrophic
//!   cancellation can make the squared distance slightly negative for
//!   (near-)identical rows, so it is floored at zero before the square root.
//!   [`self_distances`] uses the direct difference instead and is exact on
//!   the diagonal.
//! - [`logsumexp_rows`] skips the max-subtraction. It is fast but overflows
//!   for entries above ~709 and underflows to `-inf` when every entry is
//!   below ~-745. [`logsumexp_rows_stable`] is the safe variant; the kernels
//!   use it.

use serde::{Deserialize, Serialize};

use crate::error::{EntropyError, Result};
use crate::simd;

/// Relative determinant threshold below which a 3x3 matrix is treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// Dense row-major `f64` matrix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Wrap a flat row-major buffer.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(EntropyError::DimensionMismatch {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// All-zero matrix.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Build from a list of equal-length rows. See [`stack_rows`].
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        stack_rows(rows)
    }

    /// Concatenate matrices vertically.
    ///
    /// Matrices with zero rows are skipped, so they never cause a width mismatch.
    pub fn concat_rows<'a, I>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Matrix>,
    {
        let mut out: Option<Matrix> = None;
        for part in parts {
            if part.rows == 0 {
                continue;
            }
            match out.as_mut() {
                None => out = Some(part.clone()),
                Some(acc) => {
                    if acc.cols != part.cols {
                        return Err(EntropyError::DimensionMismatch {
                            expected: acc.cols,
                            got: part.cols,
                        });
                    }
                    acc.data.extend_from_slice(&part.data);
                    acc.rows += part.rows;
                }
            }
        }
        Ok(out.unwrap_or_default())
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Flat row-major view of the data.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.cols;
        &mut self.data[start..start + self.cols]
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Gather the given rows (in the given order, repeats allowed).
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// Contiguous block of rows `start..end`.
    #[must_use]
    pub fn slice_rows(&self, start: usize, end: usize) -> Matrix {
        let end = end.min(self.rows);
        let start = start.min(end);
        Matrix {
            data: self.data[start * self.cols..end * self.cols].to_vec(),
            rows: end - start,
            cols: self.cols,
        }
    }

    /// Column-wise mean. Empty matrices yield a zero vector.
    #[must_use]
    pub fn mean_row(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.cols];
        if self.rows == 0 {
            return mean;
        }
        for row in self.iter_rows() {
            simd::add_assign(&mut mean, row);
        }
        let n = self.rows as f64;
        for v in mean.iter_mut() {
            *v /= n;
        }
        mean
    }

    /// Apply `f` element-wise.
    #[must_use]
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Matrix {
        Matrix {
            data: self.data.iter().map(|&v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// Euclidean distances between every row of `a` (N×d) and every row of `b` (M×d).
///
/// Returns an N×M matrix.
pub fn pairwise_distances(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.cols != b.cols {
        return Err(EntropyError::DimensionMismatch {
            expected: a.cols,
            got: b.cols,
        });
    }

    let norm_a: Vec<f64> = a.iter_rows().map(simd::norm_squared).collect();
    let norm_b: Vec<f64> = b.iter_rows().map(simd::norm_squared).collect();

    let mut out = Matrix::zeros(a.rows, b.rows);
    for i in 0..a.rows {
        let ai = a.row(i);
        let out_row = out.row_mut(i);
        for (j, slot) in out_row.iter_mut().enumerate() {
            let d2 = norm_a[i] + norm_b[j] - 2.0 * simd::dot(ai, b.row(j));
            *slot = if d2 < 0.0 { 0.0 } else { d2.sqrt() };
        }
    }
    Ok(out)
}

/// Symmetric N×N distance matrix of `a` against itself.
///
/// Only the upper triangle is computed; the diagonal is exactly zero.
#[must_use]
pub fn self_distances(a: &Matrix) -> Matrix {
    let n = a.rows;
    let mut out = Matrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = simd::l2_distance(a.row(i), a.row(j));
            out.set(i, j, d);
            out.set(j, i, d);
        }
    }
    out
}

/// `ln(Σ_j exp(x[i,j]))` for every row, without max-subtraction.
///
/// See the module docs for the overflow/underflow trade-off.
#[must_use]
pub fn logsumexp_rows(x: &Matrix) -> Vec<f64> {
    x.iter_rows()
        .map(|row| row.iter().map(|v| v.exp()).sum::<f64>().ln())
        .collect()
}

/// Max-subtracted `ln(Σ_j exp(x[i,j]))` for every row.
///
/// Rows that are empty or entirely `-inf` yield `-inf`.
#[must_use]
pub fn logsumexp_rows_stable(x: &Matrix) -> Vec<f64> {
    x.iter_rows()
        .map(|row| {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !max.is_finite() {
                return max;
            }
            let sum: f64 = row.iter().map(|v| (v - max).exp()).sum();
            max + sum.ln()
        })
        .collect()
}

/// Row-wise ascending argsort.
///
/// When `limit` is given only the first `limit` rows are sorted and returned;
/// columns are always fully ordered. Ties keep column order.
#[must_use]
pub fn argsort_rows(x: &Matrix, limit: Option<usize>) -> Vec<Vec<usize>> {
    let rows = limit.map_or(x.rows, |l| l.min(x.rows));
    (0..rows)
        .map(|i| {
            let row = x.row(i);
            let mut order: Vec<usize> = (0..x.cols).collect();
            order.sort_by(|&a, &b| row[a].total_cmp(&row[b]));
            order
        })
        .collect()
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Closed-form inverse of a 3x3 matrix (e.g. a lattice cell).
///
/// The columns of the inverse are the reciprocal vectors `(b×c, c×a, a×b) / det`.
/// Fails with [`EntropyError::SingularMatrix`] when `|det|` is negligible
/// relative to the product of the row norms.
pub fn inverse_3x3(m: &[[f64; 3]; 3]) -> Result<[[f64; 3]; 3]> {
    let bx = cross(&m[1], &m[2]);
    let by = cross(&m[2], &m[0]);
    let bz = cross(&m[0], &m[1]);

    let det = simd::dot(&m[0], &bx);
    let scale = simd::norm(&m[0]) * simd::norm(&m[1]) * simd::norm(&m[2]);
    if scale == 0.0 || det.abs() <= SINGULAR_EPS * scale {
        return Err(EntropyError::SingularMatrix(det.abs()));
    }

    let mut inv = [[0.0; 3]; 3];
    for i in 0..3 {
        inv[i][0] = bx[i] / det;
        inv[i][1] = by[i] / det;
        inv[i][2] = bz[i] / det;
    }
    Ok(inv)
}

/// Stack equal-length vectors into one contiguous matrix.
pub fn stack_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Matrix> {
    let Some(first) = rows.first() else {
        return Ok(Matrix::default());
    };
    let cols = first.as_ref().len();
    let mut data = Vec::with_capacity(rows.len() * cols);
    for row in rows {
        let row = row.as_ref();
        if row.len() != cols {
            return Err(EntropyError::DimensionMismatch {
                expected: cols,
                got: row.len(),
            });
        }
        data.extend_from_slice(row);
    }
    Ok(Matrix {
        data,
        rows: rows.len(),
        cols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid() -> Matrix {
        Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![3.0, 4.0],
            vec![1.0, 1.0],
            vec![-2.0, 5.0],
        ])
        .unwrap()
    }

    #[test]
    fn pairwise_matches_direct_distances() {
        let a = grid();
        let b = Matrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0]]).unwrap();
        let d = pairwise_distances(&a, &b).unwrap();
        assert_eq!((d.rows(), d.cols()), (4, 2));
        assert!((d.get(1, 0) - 5.0).abs() < 1e-12);
        assert!((d.get(2, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pairwise_floors_negative_squares() {
        // Large, nearly identical rows: the expansion cancels catastrophically.
        let a = Matrix::from_rows(&[vec![1e8, 1e8 + 1e-3]]).unwrap();
        let d = pairwise_distances(&a, &a).unwrap();
        assert!(d.get(0, 0) >= 0.0);
        assert!(!d.get(0, 0).is_nan());
    }

    #[test]
    fn pairwise_rejects_width_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 4);
        assert!(matches!(
            pairwise_distances(&a, &b),
            Err(EntropyError::DimensionMismatch { expected: 3, got: 4 })
        ));
    }

    #[test]
    fn self_distances_zero_diagonal() {
        let d = self_distances(&grid());
        for i in 0..4 {
            assert_eq!(d.get(i, i), 0.0);
        }
        assert!((d.get(0, 1) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn logsumexp_variants_agree_on_moderate_input() {
        let x = Matrix::from_rows(&[vec![0.0, 1.0, 2.0], vec![-3.0, -3.0, -3.0]]).unwrap();
        let fast = logsumexp_rows(&x);
        let stable = logsumexp_rows_stable(&x);
        for (f, s) in fast.iter().zip(stable.iter()) {
            assert!((f - s).abs() < 1e-12);
        }
        assert!((stable[1] - (-3.0 + 3.0_f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn logsumexp_stable_survives_extremes() {
        let x = Matrix::from_rows(&[vec![-2000.0, -2001.0], vec![1000.0, 1000.0]]).unwrap();
        let fast = logsumexp_rows(&x);
        assert!(fast[0].is_infinite() && fast[1].is_infinite());

        let stable = logsumexp_rows_stable(&x);
        assert!((stable[0] - (-2000.0 + (1.0 + (-1.0_f64).exp()).ln())).abs() < 1e-9);
        assert!((stable[1] - (1000.0 + 2.0_f64.ln())).abs() < 1e-9);

        let dead = Matrix::from_rows(&[vec![f64::NEG_INFINITY, f64::NEG_INFINITY]]).unwrap();
        assert_eq!(logsumexp_rows_stable(&dead), vec![f64::NEG_INFINITY]);
    }

    #[test]
    fn argsort_rows_limit_restricts_rows() {
        let x = Matrix::from_rows(&[
            vec![3.0, 1.0, 2.0],
            vec![0.0, -1.0, 5.0],
            vec![9.0, 8.0, 7.0],
        ])
        .unwrap();
        let all = argsort_rows(&x, None);
        assert_eq!(all, vec![vec![1, 2, 0], vec![1, 0, 2], vec![2, 1, 0]]);

        let limited = argsort_rows(&x, Some(2));
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[1], vec![1, 0, 2]);

        assert_eq!(argsort_rows(&x, Some(10)).len(), 3);
    }

    #[test]
    fn inverse_3x3_of_lattice() {
        let m = [[4.0, 0.0, 0.0], [1.0, 3.0, 0.0], [0.5, 0.2, 5.0]];
        let inv = inverse_3x3(&m).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let v: f64 = (0..3).map(|k| inv[i][k] * m[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-12, "({i},{j}) = {v}");
            }
        }
    }

    #[test]
    fn inverse_3x3_rejects_singular() {
        let m = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]];
        assert!(matches!(inverse_3x3(&m), Err(EntropyError::SingularMatrix(_))));
        assert!(inverse_3x3(&[[0.0; 3]; 3]).is_err());
    }

    #[test]
    fn stack_rows_builds_contiguous_matrix() {
        let m = stack_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(stack_rows(&[vec![1.0], vec![1.0, 2.0]]).is_err());
        assert!(stack_rows::<Vec<f64>>(&[]).unwrap().is_empty());
    }

    #[test]
    fn concat_and_select() {
        let a = grid();
        let b = Matrix::from_rows(&[vec![7.0, 7.0]]).unwrap();
        let c = Matrix::concat_rows([&a, &Matrix::default(), &b]).unwrap();
        assert_eq!(c.rows(), 5);
        assert_eq!(c.row(4), &[7.0, 7.0]);

        let s = c.select_rows(&[4, 0]);
        assert_eq!(s.row(0), &[7.0, 7.0]);
        assert_eq!(s.row(1), &[0.0, 0.0]);

        assert_eq!(c.slice_rows(1, 3).rows(), 2);
        assert_eq!(b.mean_row(), vec![7.0, 7.0]);
    }

    prop_compose! {
        fn arb_matrix(max_rows: usize, dim: usize)
            (rows in 1..max_rows)
            (data in prop::collection::vec(-10.0f64..10.0, rows * dim), rows in Just(rows))
            -> Matrix
        {
            Matrix::new(rows, dim, data).unwrap()
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_self_distances_symmetric(a in arb_matrix(12, 5)) {
            let d = self_distances(&a);
            for i in 0..a.rows() {
                prop_assert_eq!(d.get(i, i), 0.0);
                for j in 0..a.rows() {
                    prop_assert_eq!(d.get(i, j), d.get(j, i));
                }
            }
        }

        #[test]
        fn prop_pairwise_matches_self_off_diagonal(a in arb_matrix(12, 5)) {
            let p = pairwise_distances(&a, &a).unwrap();
            let s = self_distances(&a);
            for i in 0..a.rows() {
                for j in 0..a.rows() {
                    if i != j {
                        prop_assert!((p.get(i, j) - s.get(i, j)).abs() < 1e-6);
                    }
                }
            }
        }
    }
}
