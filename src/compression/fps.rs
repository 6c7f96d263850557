//! Farthest-point ranking of frames.
//!
//! Each frame is represented by its mean descriptor. Starting from one
//! frame, every step appends the candidate whose minimum distance to the
//! already-ranked representatives is largest. Ties go to the lower index.

use super::{argmax_first, check_frames, mean_descriptors};
use crate::error::Result;
use crate::matrix::Matrix;
use crate::simd;

/// Farthest-point order over the rows of `points`, starting at `start`.
///
/// Returns at most `limit` indices (all rows when `None`), without duplicates.
#[must_use]
pub fn farthest_point_order(points: &Matrix, start: usize, limit: Option<usize>) -> Vec<usize> {
    let n = points.rows();
    let limit = limit.map_or(n, |l| l.min(n));
    if limit == 0 || start >= n {
        return Vec::new();
    }

    let mut order = Vec::with_capacity(limit);
    let mut taken = vec![false; n];
    let mut min_dist = vec![f64::INFINITY; n];

    let mut current = start;
    loop {
        order.push(current);
        taken[current] = true;
        if order.len() == limit {
            break;
        }

        let anchor = points.row(current);
        for (i, slot) in min_dist.iter_mut().enumerate() {
            if !taken[i] {
                *slot = slot.min(simd::l2_distance(points.row(i), anchor));
            }
        }

        match argmax_first((0..n).filter(|&i| !taken[i]).map(|i| (i, min_dist[i]))) {
            Some(next) => current = next,
            None => break,
        }
    }

    order
}

/// Full farthest-point ranking of `frames`.
///
/// Starts from the frame with the highest standalone entropy. Frames without
/// descriptors are represented by the zero vector.
pub fn farthest_point_ranking(frames: &[Matrix], entropies: &[f64]) -> Result<Vec<usize>> {
    check_frames(frames.len(), entropies)?;
    let Some(start) = argmax_first(entropies.iter().copied().enumerate()) else {
        return Ok(Vec::new());
    };

    let representatives = mean_descriptors(frames)?;
    Ok(farthest_point_order(&representatives, start, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(v: f64) -> Matrix {
        Matrix::from_rows(&[vec![v - 0.1], vec![v + 0.1]]).unwrap()
    }

    #[test]
    fn spreads_out_on_a_line() {
        let frames: Vec<Matrix> = [0.0, 1.0, 2.0, 3.0, 10.0].iter().map(|&v| frame(v)).collect();
        let entropies = vec![0.0, 0.0, 5.0, 0.0, 0.0];
        let ranking = farthest_point_ranking(&frames, &entropies).unwrap();
        // Starts at the highest-entropy frame, then the far outlier, then the far end.
        assert_eq!(ranking[..3], [2, 4, 0]);
        let mut sorted = ranking.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn frames_without_descriptors_are_ranked() {
        let a = Matrix::from_rows(&[vec![1.0, 1.0]]).unwrap();
        let b = Matrix::from_rows(&[vec![-1.0, 1.0]]).unwrap();
        let entropies = vec![1.0, 0.0, 0.5];

        let shapeless = vec![a.clone(), Matrix::default(), b.clone()];
        let ranking = farthest_point_ranking(&shapeless, &entropies).unwrap();
        assert_eq!(ranking, vec![0, 2, 1]);

        let sized = vec![a, Matrix::zeros(0, 2), b];
        assert_eq!(farthest_point_ranking(&sized, &entropies).unwrap(), ranking);
    }

    #[test]
    fn ties_go_to_lower_index() {
        let points = Matrix::from_rows(&[vec![0.0], vec![-1.0], vec![1.0]]).unwrap();
        assert_eq!(farthest_point_order(&points, 0, None), vec![0, 1, 2]);
    }

    #[test]
    fn limit_truncates() {
        let points = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(farthest_point_order(&points, 1, Some(2)), vec![1, 0]);
        assert!(farthest_point_order(&points, 0, Some(0)).is_empty());
    }
}
