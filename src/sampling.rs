//! Repeated-subsample entropy estimation and its JSON report.
//!
//! A single estimate over a large descriptor set is expensive and says
//! nothing about its own spread. Instead, `num_runs` trials each draw
//! `sample` rows with replacement, build a fresh [`EntropyEstimator`] on the
//! draw, and record its dataset entropy. Trial `t` draws from
//! `StdRng::seed_from_u64(seed + t)`, so results do not depend on the
//! number of worker threads.

use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::descriptor::DescriptorConfig;
use crate::entropy::{EntropyEstimator, EstimatorParams};
use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;
use crate::parallel::with_jobs;

/// Settings for [`resample_entropy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerParams {
    /// Rows drawn per trial; `None` (or at least `n`) uses the whole set.
    pub sample: Option<usize>,
    pub num_runs: usize,
    pub jobs: Option<usize>,
    pub seed: u64,
    pub estimator: EstimatorParams,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            sample: Some(1000),
            num_runs: 20,
            jobs: None,
            seed: 42,
            estimator: EstimatorParams::default(),
        }
    }
}

/// Dataset entropy of `num_runs` independent subsamples of `x`, in trial order.
pub fn resample_entropy(x: &Matrix, params: &SamplerParams) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(EntropyError::EmptyReference);
    }
    if params.num_runs == 0 {
        return Err(EntropyError::InvalidParameter(
            "num_runs must be greater than 0".to_string(),
        ));
    }

    let n = x.rows();
    let sample = match params.sample {
        Some(0) => {
            return Err(EntropyError::InvalidParameter(
                "sample must be greater than 0".to_string(),
            ))
        }
        Some(s) if s < n => Some(s),
        _ => None,
    };

    let Some(sample) = sample else {
        // Every trial would see the same rows.
        let estimator = EntropyEstimator::new(x.clone(), params.estimator.clone())?;
        let entropy = estimator.dataset_entropy()?;
        info!(n, entropy, runs = params.num_runs, "full-set entropy");
        return Ok(vec![entropy; params.num_runs]);
    };

    with_jobs(params.jobs, || {
        (0..params.num_runs)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let rows: Vec<usize> = (0..sample).map(|_| rng.random_range(0..n)).collect();
                let estimator =
                    EntropyEstimator::new(x.select_rows(&rows), params.estimator.clone())?;
                let entropy = estimator.dataset_entropy()?;
                info!(trial = t, sample, entropy, "resampled entropy");
                Ok(entropy)
            })
            .collect::<Result<Vec<f64>>>()
    })?
}

/// Record of one entropy run: where the data came from, every setting, and
/// the per-trial entropies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyReport {
    pub file: String,
    pub cutoff: f64,
    pub cutoff_interaction: f64,
    pub nbrs_descriptor: usize,
    pub nbrs_tree: usize,
    pub bandwidth: f64,
    pub kernel: String,
    pub sample: Option<usize>,
    pub num_runs: usize,
    pub jobs: Option<usize>,
    pub entropies: Vec<f64>,
}

impl EntropyReport {
    pub fn new(
        file: impl Into<String>,
        descriptor: &DescriptorConfig,
        params: &SamplerParams,
        entropies: Vec<f64>,
    ) -> Self {
        Self {
            file: file.into(),
            cutoff: descriptor.cutoff,
            cutoff_interaction: descriptor.interaction_cutoff,
            nbrs_descriptor: descriptor.k,
            nbrs_tree: params.estimator.nbrs,
            bandwidth: params.estimator.bandwidth,
            kernel: params.estimator.kernel.to_string(),
            sample: params.sample,
            num_runs: params.num_runs,
            jobs: params.jobs,
            entropies,
        }
    }

    pub fn mean_entropy(&self) -> Option<f64> {
        if self.entropies.is_empty() {
            return None;
        }
        Some(self.entropies.iter().sum::<f64>() / self.entropies.len() as f64)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
