//! Per-frame descriptors and standalone entropies.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::{DescriptorConfig, DescriptorExtractor};
use crate::entropy::{check_bandwidth, perfect_entropy, DEFAULT_BANDWIDTH, DEFAULT_BATCH_SIZE};
use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;
use crate::parallel::with_jobs;

/// Settings shared by every compression entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionParams {
    /// Forwarded to the descriptor extractor.
    pub descriptor: DescriptorConfig,
    /// KDE bandwidth for entropies and coverage.
    pub bandwidth: f64,
    /// Rows per distance block in the exact entropy.
    pub batch_size: usize,
    /// Weight `l` of the standalone entropy in coverage ranking.
    pub entropy_weight: f64,
    /// Worker threads; `None` uses the global pool.
    pub jobs: Option<usize>,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            descriptor: DescriptorConfig::default(),
            bandwidth: DEFAULT_BANDWIDTH,
            batch_size: DEFAULT_BATCH_SIZE,
            entropy_weight: 0.0,
            jobs: None,
        }
    }
}

impl CompressionParams {
    pub(crate) fn validate(&self) -> Result<()> {
        check_bandwidth(self.bandwidth)?;
        if self.batch_size == 0 {
            return Err(EntropyError::InvalidParameter(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if !self.entropy_weight.is_finite() {
            return Err(EntropyError::InvalidParameter(format!(
                "entropy_weight must be finite, got {}",
                self.entropy_weight
            )));
        }
        Ok(())
    }
}

/// Descriptors and standalone entropy of every frame, in dataset order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameData {
    pub descriptors: Vec<Matrix>,
    pub entropies: Vec<f64>,
}

impl FrameData {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Extract descriptors for every frame and compute each frame's
/// [`perfect_entropy`]. Frames are processed in parallel.
///
/// A frame with no descriptors gets entropy 0. The first extractor failure
/// aborts the whole call.
pub fn frame_descriptors_and_entropies<F, E>(
    dataset: &[F],
    extractor: &E,
    params: &CompressionParams,
) -> Result<FrameData>
where
    F: Sync,
    E: DescriptorExtractor<F> + ?Sized,
{
    params.validate()?;

    let per_frame: Vec<(Matrix, f64)> = with_jobs(params.jobs, || {
        dataset
            .par_iter()
            .map(|frame| {
                let descriptors = extractor.descriptors(frame, &params.descriptor)?;
                let entropy = if descriptors.is_empty() {
                    0.0
                } else {
                    perfect_entropy(&descriptors, params.bandwidth, params.batch_size)?
                };
                Ok((descriptors, entropy))
            })
            .collect::<Result<Vec<_>>>()
    })??;

    debug!(frames = per_frame.len(), "frame descriptors extracted");

    let (descriptors, entropies) = per_frame.into_iter().unzip();
    Ok(FrameData {
        descriptors,
        entropies,
    })
}
