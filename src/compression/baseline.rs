//! Baseline selectors for benchmarking against the ranking strategies.
//!
//! All of them satisfy one contract: given per-frame descriptors and
//! entropies, return exactly `size` distinct frame indices. Randomness always
//! comes from the caller's generator.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::{index, IndexedRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::fps::farthest_point_order;
use super::mean_descriptors;
use super::optimizer::{BoundedOptimizer, GoldenSectionSearch};
use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;
use crate::partitioning::{dbscan_labels, KMeans};

/// A pluggable frame selector.
pub trait SelectionStrategy {
    fn select(
        &self,
        descriptors: &[Matrix],
        entropies: &[f64],
        size: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<usize>>;
}

/// Available baseline selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineKind {
    /// Uniform sampling without replacement.
    Random,
    /// Farthest-point sampling on mean descriptors.
    MeanFps,
    /// One member per k-means cluster of mean descriptors.
    KMeans,
    /// One member per density cluster of mean descriptors.
    Dbscan,
}

impl BaselineKind {
    /// The selector implementing this kind.
    pub fn strategy(self) -> Box<dyn SelectionStrategy> {
        match self {
            BaselineKind::Random => Box::new(RandomSample),
            BaselineKind::MeanFps => Box::new(MeanFarthestPoint),
            BaselineKind::KMeans => Box::new(KMeansSample),
            BaselineKind::Dbscan => Box::new(DbscanSample::default()),
        }
    }
}

impl FromStr for BaselineKind {
    type Err = EntropyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(BaselineKind::Random),
            "mean_fps" | "fps" => Ok(BaselineKind::MeanFps),
            "k_means" | "kmeans" => Ok(BaselineKind::KMeans),
            "dbscan" => Ok(BaselineKind::Dbscan),
            _ => Err(EntropyError::UnknownBaseline(s.to_string())),
        }
    }
}

impl fmt::Display for BaselineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaselineKind::Random => "random",
            BaselineKind::MeanFps => "mean_fps",
            BaselineKind::KMeans => "kmeans",
            BaselineKind::Dbscan => "dbscan",
        };
        f.write_str(name)
    }
}

fn check_size(n: usize, entropies: &[f64], size: usize) -> Result<()> {
    super::check_frames(n, entropies)?;
    if size > n {
        return Err(EntropyError::InvalidParameter(format!(
            "cannot select {size} of {n} frames"
        )));
    }
    Ok(())
}

/// Pick one random member of each cluster, then trim or top up to `size`.
fn one_per_cluster(
    labels: &[usize],
    num_clusters: usize,
    size: usize,
    rng: &mut StdRng,
) -> Vec<usize> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); num_clusters];
    for (i, &label) in labels.iter().enumerate() {
        members[label].push(i);
    }

    let mut picked: Vec<usize> = members
        .iter()
        .filter_map(|m| m.choose(rng).copied())
        .collect();

    if picked.len() > size {
        let keep = index::sample(rng, picked.len(), size);
        picked = keep.iter().map(|k| picked[k]).collect();
    } else if picked.len() < size {
        let mut taken = vec![false; labels.len()];
        for &p in &picked {
            taken[p] = true;
        }
        let rest: Vec<usize> = (0..labels.len()).filter(|&i| !taken[i]).collect();
        let extra = index::sample(rng, rest.len(), size - picked.len());
        picked.extend(extra.iter().map(|k| rest[k]));
    }
    picked
}

/// Uniform random sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSample;

impl SelectionStrategy for RandomSample {
    fn select(
        &self,
        descriptors: &[Matrix],
        entropies: &[f64],
        size: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        check_size(descriptors.len(), entropies, size)?;
        Ok(index::sample(rng, descriptors.len(), size).into_vec())
    }
}

/// Farthest-point sampling on per-frame mean descriptors from a random start.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanFarthestPoint;

impl SelectionStrategy for MeanFarthestPoint {
    fn select(
        &self,
        descriptors: &[Matrix],
        entropies: &[f64],
        size: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        check_size(descriptors.len(), entropies, size)?;
        if size == 0 {
            return Ok(Vec::new());
        }
        let means = mean_descriptors(descriptors)?;
        let start = rng.random_range(0..descriptors.len());
        Ok(farthest_point_order(&means, start, Some(size)))
    }
}

/// k-means on mean descriptors with `size` clusters.
#[derive(Debug, Clone, Copy, Default)]
pub struct KMeansSample;

impl SelectionStrategy for KMeansSample {
    fn select(
        &self,
        descriptors: &[Matrix],
        entropies: &[f64],
        size: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        check_size(descriptors.len(), entropies, size)?;
        if size == 0 {
            return Ok(Vec::new());
        }
        let means = mean_descriptors(descriptors)?;
        let mut kmeans = KMeans::new(size, rng.random())?;
        kmeans.fit(&means)?;
        let labels = kmeans.assign_clusters(&means);
        Ok(one_per_cluster(&labels, size, size, rng))
    }
}

/// Density clustering of mean descriptors.
///
/// The neighborhood radius is searched in `[min_eps, max_eps]` so that the
/// cluster count lands as close to `size` as possible.
#[derive(Debug, Clone, Copy)]
pub struct DbscanSample {
    pub min_eps: f64,
    pub max_eps: f64,
    pub search: GoldenSectionSearch,
}

impl Default for DbscanSample {
    fn default() -> Self {
        Self {
            min_eps: 1e-4,
            max_eps: 0.05,
            search: GoldenSectionSearch {
                init_points: 5,
                n_iter: 15,
            },
        }
    }
}

impl SelectionStrategy for DbscanSample {
    fn select(
        &self,
        descriptors: &[Matrix],
        entropies: &[f64],
        size: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        check_size(descriptors.len(), entropies, size)?;
        if size == 0 {
            return Ok(Vec::new());
        }
        let means = mean_descriptors(descriptors)?;

        let mut cost = |eps: f64| -> Result<f64> {
            let (_, clusters) = dbscan_labels(&means, eps)?;
            Ok(-(clusters as f64 - size as f64).abs())
        };
        let best = self.search.maximize(&mut cost, self.min_eps, self.max_eps)?;

        let (labels, clusters) = dbscan_labels(&means, best.x)?;
        Ok(one_per_cluster(&labels, clusters, size, rng))
    }
}
