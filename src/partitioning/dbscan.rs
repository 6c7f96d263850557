//! Density-based clustering with `min_samples = 1`.
//!
//! With a single-point core condition every point is a core point, so the
//! clusters are exactly the connected components of the graph linking points
//! closer than `eps`. Components are found with union-find over the upper
//! triangle of the distance matrix.

use crate::error::{EntropyError, Result};
use crate::matrix::{self_distances, Matrix};

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Cluster labels `0..num_clusters` for every row of `points`.
///
/// Labels are assigned in order of each cluster's first row, so the result
/// is deterministic.
pub fn dbscan_labels(points: &Matrix, eps: f64) -> Result<(Vec<usize>, usize)> {
    if !(eps.is_finite() && eps > 0.0) {
        return Err(EntropyError::InvalidParameter(format!(
            "dbscan eps must be > 0, got {eps}"
        )));
    }

    let n = points.rows();
    let dist = self_distances(points);
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if dist.get(i, j) <= eps {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri.max(rj)] = ri.min(rj);
                }
            }
        }
    }

    let mut label_of_root = vec![usize::MAX; n];
    let mut labels = Vec::with_capacity(n);
    let mut next = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        if label_of_root[root] == usize::MAX {
            label_of_root[root] = next;
            next += 1;
        }
        labels.push(label_of_root[root]);
    }
    Ok((labels, next))
}
