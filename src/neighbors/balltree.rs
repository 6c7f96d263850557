//! Ball Tree implementation.
//!
//! Space-partitioning tree using hyperspheres (balls) instead of hyperplanes.
//! Better than a KD-Tree for the medium-to-high dimensional descriptors the
//! entropy estimator works with.
//!
//! Algorithm:
//! - Recursive space partitioning using hyperspheres
//! - Each node represents a ball (center + radius) containing its vectors
//! - Split seeds are an approximate farthest pair (farthest point from the
//!   centroid, then the point farthest from that), which keeps construction
//!   linear per level
//!
//! Queries are exact: a ball is skipped only when it provably cannot contain
//! a point closer than the current k-th best distance.
//!
//! # References
//!
//! - Omohundro (1989): "Five balltree construction algorithms"
//! - Liu et al. (2006): "An investigation of practical approximate nearest neighbor algorithms"

use serde::{Deserialize, Serialize};

use super::traits::NeighborProvider;
use super::check_query;
use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;
use crate::simd;

/// Ball Tree index over a reference matrix.
pub struct BallTree {
    vectors: Matrix,
    params: BallTreeParams,
    root: Option<BallNode>,
}

/// Ball Tree parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BallTreeParams {
    /// Maximum leaf size
    pub max_leaf_size: usize,

    /// Maximum depth
    pub max_depth: usize,
}

impl Default for BallTreeParams {
    fn default() -> Self {
        Self {
            max_leaf_size: 16,
            max_depth: 48,
        }
    }
}

/// Ball Tree node.
enum BallNode {
    /// Internal node: has center, radius, and children
    Internal {
        center: Vec<f64>,
        radius: f64,
        left: Box<BallNode>,
        right: Box<BallNode>,
    },
    /// Leaf node: contains vector indices
    Leaf {
        indices: Vec<u32>,
        center: Vec<f64>,
        radius: f64,
    },
}

impl BallNode {
    fn ball(&self) -> (&[f64], f64) {
        match self {
            BallNode::Internal { center, radius, .. } => (center, *radius),
            BallNode::Leaf { center, radius, .. } => (center, *radius),
        }
    }
}

/// Current k best candidates, kept as (distance, index) pairs.
struct KBest {
    k: usize,
    items: Vec<(f64, u32)>,
    worst: f64,
}

impl KBest {
    fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k),
            worst: f64::INFINITY,
        }
    }

    /// Pruning threshold: infinite until k candidates are known.
    #[inline]
    fn bound(&self) -> f64 {
        self.worst
    }

    fn offer(&mut self, dist: f64, idx: u32) {
        if self.items.len() < self.k {
            self.items.push((dist, idx));
            if self.items.len() == self.k {
                self.refresh_worst();
            }
        } else if dist < self.worst {
            if let Some(slot) = self
                .items
                .iter()
                .enumerate()
                .max_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
                .map(|(i, _)| i)
            {
                self.items[slot] = (dist, idx);
                self.refresh_worst();
            }
        }
    }

    fn refresh_worst(&mut self) {
        self.worst = self
            .items
            .iter()
            .map(|&(d, _)| d)
            .fold(f64::NEG_INFINITY, f64::max);
    }

    fn into_sorted(mut self) -> Vec<(f64, u32)> {
        self.items
            .sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        self.items
    }
}

impl BallTree {
    /// Create an unbuilt tree.
    pub fn new(params: BallTreeParams) -> Result<Self> {
        if params.max_leaf_size == 0 {
            return Err(EntropyError::InvalidParameter(
                "ball tree max_leaf_size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            vectors: Matrix::default(),
            params,
            root: None,
        })
    }

    /// Build tree recursively.
    fn build_tree(&self, indices: &[u32], depth: usize) -> BallNode {
        let center = self.compute_center(indices);
        let radius = self.compute_radius(indices, &center);

        // Leaf node if small enough or max depth reached
        if indices.len() <= self.params.max_leaf_size || depth >= self.params.max_depth {
            return BallNode::Leaf {
                indices: indices.to_vec(),
                center,
                radius,
            };
        }

        let (seed1, seed2) = self.split_seeds(indices, &center);
        let seed1 = self.vectors.row(seed1 as usize);
        let seed2 = self.vectors.row(seed2 as usize);

        // Split indices by distance to seeds
        let mut left_indices = Vec::new();
        let mut right_indices = Vec::new();
        for &idx in indices {
            let vec = self.vectors.row(idx as usize);
            if simd::l2_distance_squared(vec, seed1) < simd::l2_distance_squared(vec, seed2) {
                left_indices.push(idx);
            } else {
                right_indices.push(idx);
            }
        }

        // Coincident seeds put everything on one side; halve instead.
        if left_indices.is_empty() || right_indices.is_empty() {
            let mut all = indices.to_vec();
            right_indices = all.split_off(all.len() / 2);
            left_indices = all;
        }

        let left = self.build_tree(&left_indices, depth + 1);
        let right = self.build_tree(&right_indices, depth + 1);

        BallNode::Internal {
            center,
            radius,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Compute center of vectors.
    fn compute_center(&self, indices: &[u32]) -> Vec<f64> {
        let mut center = vec![0.0; self.vectors.cols()];
        for &idx in indices {
            simd::add_assign(&mut center, self.vectors.row(idx as usize));
        }
        let count = indices.len() as f64;
        for val in center.iter_mut() {
            *val /= count;
        }
        center
    }

    /// Compute radius (max distance from center).
    fn compute_radius(&self, indices: &[u32], center: &[f64]) -> f64 {
        indices
            .iter()
            .map(|&idx| simd::l2_distance(self.vectors.row(idx as usize), center))
            .fold(0.0, f64::max)
    }

    fn farthest_from(&self, indices: &[u32], from: &[f64]) -> u32 {
        let mut best = indices[0];
        let mut best_dist = f64::NEG_INFINITY;
        for &idx in indices {
            let d = simd::l2_distance_squared(self.vectors.row(idx as usize), from);
            if d > best_dist {
                best_dist = d;
                best = idx;
            }
        }
        best
    }

    /// Approximate farthest pair in two linear passes.
    fn split_seeds(&self, indices: &[u32], center: &[f64]) -> (u32, u32) {
        let a = self.farthest_from(indices, center);
        let b = self.farthest_from(indices, self.vectors.row(a as usize));
        (a, b)
    }

    /// Search for the k nearest reference points of `query`.
    ///
    /// Returns `(index, distance)` pairs sorted by ascending distance.
    pub fn search(&self, query: &[f64], k: usize) -> Result<Vec<(u32, f64)>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| EntropyError::InvalidParameter("ball tree not built".to_string()))?;
        if query.len() != self.vectors.cols() {
            return Err(EntropyError::DimensionMismatch {
                expected: self.vectors.cols(),
                got: query.len(),
            });
        }

        let mut best = KBest::new(k);
        self.search_recursive_pruned(root, query, &mut best);
        Ok(best
            .into_sorted()
            .into_iter()
            .map(|(d, idx)| (idx, d))
            .collect())
    }

    /// Search with radius-based pruning.
    ///
    /// Pruning rule: if `dist(query, center) - radius > best`, the ball
    /// cannot contain any point closer than our current k-th best, so skip it.
    fn search_recursive_pruned(&self, node: &BallNode, query: &[f64], best: &mut KBest) {
        let (center, radius) = node.ball();
        let min_possible = (simd::l2_distance(query, center) - radius).max(0.0);
        if min_possible > best.bound() {
            return;
        }

        match node {
            BallNode::Leaf { indices, .. } => {
                for &idx in indices {
                    let dist = simd::l2_distance(query, self.vectors.row(idx as usize));
                    best.offer(dist, idx);
                }
            }
            BallNode::Internal { left, right, .. } => {
                let (lc, lr) = left.ball();
                let (rc, rr) = right.ball();
                let left_min = (simd::l2_distance(query, lc) - lr).max(0.0);
                let right_min = (simd::l2_distance(query, rc) - rr).max(0.0);

                // Visit closer child first (more likely to tighten the bound early)
                if left_min <= right_min {
                    self.search_recursive_pruned(left, query, best);
                    self.search_recursive_pruned(right, query, best);
                } else {
                    self.search_recursive_pruned(right, query, best);
                    self.search_recursive_pruned(left, query, best);
                }
            }
        }
    }
}

impl NeighborProvider for BallTree {
    fn build(&mut self, reference: &Matrix) -> Result<()> {
        if reference.is_empty() {
            return Err(EntropyError::EmptyReference);
        }
        if reference.rows() > u32::MAX as usize {
            return Err(EntropyError::InvalidParameter(format!(
                "ball tree holds at most {} points, got {}",
                u32::MAX,
                reference.rows()
            )));
        }
        self.vectors = reference.clone();
        let indices: Vec<u32> = (0..reference.rows() as u32).collect();
        self.root = Some(self.build_tree(&indices, 0));
        Ok(())
    }

    fn query(&self, points: &Matrix, k: usize) -> Result<Matrix> {
        check_query(self.root.is_some(), self.num_points(), self.dimension(), points, k)?;

        let mut out = Matrix::zeros(points.rows(), k);
        for (i, query) in points.iter_rows().enumerate() {
            let hits = self.search(query, k)?;
            for (slot, (_, d)) in out.row_mut(i).iter_mut().zip(hits) {
                *slot = d;
            }
        }
        Ok(out)
    }

    fn num_points(&self) -> usize {
        self.vectors.rows()
    }

    fn dimension(&self) -> usize {
        self.vectors.cols()
    }

    fn name(&self) -> &'static str {
        "balltree"
    }
}
