//! k-means clustering implementation.
//!
//! Lloyd iterations with k-means++ seeding over Euclidean distance. Used by
//! the centroid-based baseline selector.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;
use crate::simd;

/// Maximum Lloyd iterations.
const MAX_ITERATIONS: usize = 100;

/// Centroid movement below which the fit is considered converged.
const TOLERANCE: f64 = 1e-9;

/// k-means clustering for partitioning vectors.
pub struct KMeans {
    /// Centroids (k x dimension)
    centroids: Vec<Vec<f64>>,
    k: usize,
    seed: u64,
}

impl KMeans {
    /// Create new k-means with k clusters and a seed for k-means++.
    ///
    /// Repeated `fit(...)` calls on the same inputs produce identical results.
    pub fn new(k: usize, seed: u64) -> Result<Self> {
        if k == 0 {
            return Err(EntropyError::InvalidParameter(
                "k must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            centroids: Vec::new(),
            k,
            seed,
        })
    }

    /// Train k-means on the rows of `vectors`.
    pub fn fit(&mut self, vectors: &Matrix) -> Result<()> {
        if vectors.rows() < self.k {
            return Err(EntropyError::InvalidParameter(format!(
                "k-means needs at least {} vectors, got {}",
                self.k,
                vectors.rows()
            )));
        }

        self.centroids = self.kmeans_plus_plus(vectors);

        for _iteration in 0..MAX_ITERATIONS {
            let assignments = self.assign_clusters(vectors);
            let new_centroids = self.update_centroids(vectors, &assignments);

            let converged = self
                .centroids
                .iter()
                .zip(new_centroids.iter())
                .all(|(old, new)| simd::l2_distance(old, new) <= TOLERANCE);

            self.centroids = new_centroids;
            if converged {
                break;
            }
        }

        Ok(())
    }

    /// k-means++ initialization: each new centroid is drawn with probability
    /// proportional to its squared distance from the nearest chosen one.
    fn kmeans_plus_plus(&self, vectors: &Matrix) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = vectors.rows();

        let mut centroids = Vec::with_capacity(self.k);
        centroids.push(vectors.row(rng.random_range(0..n)).to_vec());

        let mut nearest: Vec<f64> = vectors
            .iter_rows()
            .map(|v| simd::l2_distance_squared(v, &centroids[0]))
            .collect();

        while centroids.len() < self.k {
            let total: f64 = nearest.iter().sum();
            let next = if total > 0.0 {
                let threshold = rng.random::<f64>() * total;
                let mut cumulative = 0.0;
                let mut chosen = n - 1;
                for (i, &d) in nearest.iter().enumerate() {
                    cumulative += d;
                    if cumulative >= threshold && d > 0.0 {
                        chosen = i;
                        break;
                    }
                }
                chosen
            } else {
                // All points coincide with existing centroids
                rng.random_range(0..n)
            };

            let centroid = vectors.row(next).to_vec();
            for (i, v) in vectors.iter_rows().enumerate() {
                nearest[i] = nearest[i].min(simd::l2_distance_squared(v, &centroid));
            }
            centroids.push(centroid);
        }

        centroids
    }

    /// Assign vectors to nearest clusters.
    pub fn assign_clusters(&self, vectors: &Matrix) -> Vec<usize> {
        vectors
            .iter_rows()
            .map(|vec| {
                let mut best_cluster = 0;
                let mut best_dist = f64::INFINITY;
                for (cluster_idx, centroid) in self.centroids.iter().enumerate() {
                    let dist = simd::l2_distance_squared(vec, centroid);
                    if dist < best_dist {
                        best_dist = dist;
                        best_cluster = cluster_idx;
                    }
                }
                best_cluster
            })
            .collect()
    }

    /// Update centroids based on assignments.
    fn update_centroids(&self, vectors: &Matrix, assignments: &[usize]) -> Vec<Vec<f64>> {
        let mut sums = vec![vec![0.0; vectors.cols()]; self.k];
        let mut counts = vec![0usize; self.k];

        for (vec, &cluster) in vectors.iter_rows().zip(assignments.iter()) {
            counts[cluster] += 1;
            simd::add_assign(&mut sums[cluster], vec);
        }

        sums.into_iter()
            .zip(counts)
            .zip(self.centroids.iter())
            .map(|((sum, count), old)| {
                if count > 0 {
                    sum.into_iter().map(|s| s / count as f64).collect()
                } else {
                    // Empty cluster: keep old centroid
                    old.clone()
                }
            })
            .collect()
    }

    /// Get centroids.
    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }
}
