//! Kernel-density entropy estimation.
//!
//! # Estimator
//!
//! For a reference set `X` of `n` descriptors and bandwidth `h`, the
//! pointwise ("delta") entropy of a query `y` is
//!
//! ```text
//! δH(y) = −ln Σ_{j ∈ kNN(y)} K(‖y − x_j‖ / h)
//! ```
//!
//! and the entropy of a query set `Y` is
//!
//! ```text
//! H(Y) = ln(n) + mean_{y ∈ Y} δH(y)          (nats)
//! ```
//!
//! Only the `k` nearest reference points enter the sum. For the Gaussian
//! kernel the truncation error vanishes as `k → n`, and with `k = n` the
//! estimate equals [`perfect_entropy`]. The nearest distances come from a
//! [`NeighborProvider`] built once at construction.
//!
//! # Bandwidth
//!
//! `h` sets the scale at which two descriptors count as "the same". As
//! `h → 0` every point is resolved and `H → ln n`; as `h` grows past the
//! spread of a cluster, the whole cluster collapses into one effective
//! sample and `H` drops toward `ln(number of clusters)`.

mod exact;
mod kernel;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use exact::{diversity, exact_delta_entropy, kernel_sum, perfect_entropy, DEFAULT_BATCH_SIZE};
pub use kernel::{Kernel, EPANECHNIKOV_EPS};

use crate::distance::Metric;
use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;
use crate::neighbors::{NeighborProvider, ProviderKind};

/// Default KDE bandwidth.
pub const DEFAULT_BANDWIDTH: f64 = 0.015;

/// Default number of neighbors per density query.
pub const DEFAULT_NBRS: usize = 100;

/// Entropy estimator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorParams {
    /// KDE bandwidth `h` (> 0).
    pub bandwidth: f64,
    /// Neighbors per density query (`1 ≤ nbrs ≤ n`).
    pub nbrs: usize,
    pub kernel: Kernel,
    pub provider: ProviderKind,
    pub metric: Metric,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            bandwidth: DEFAULT_BANDWIDTH,
            nbrs: DEFAULT_NBRS,
            kernel: Kernel::default(),
            provider: ProviderKind::default(),
            metric: Metric::default(),
        }
    }
}

impl EstimatorParams {
    /// Parameters from string identifiers, as they arrive from a config
    /// file or command line. Unknown names fail here.
    pub fn from_names(
        bandwidth: f64,
        nbrs: usize,
        kernel: &str,
        provider: &str,
        metric: &str,
    ) -> Result<Self> {
        Ok(Self {
            bandwidth,
            nbrs,
            kernel: kernel.parse()?,
            provider: provider.parse()?,
            metric: metric.parse()?,
        })
    }
}

pub(crate) fn check_bandwidth(h: f64) -> Result<()> {
    if !(h.is_finite() && h > 0.0) {
        return Err(EntropyError::InvalidBandwidth(h));
    }
    Ok(())
}

/// Kernel-based entropy estimator over a fixed reference set.
///
/// Immutable once built; every method is a pure function of the reference
/// set, the parameters and the query.
pub struct EntropyEstimator {
    reference: Matrix,
    params: EstimatorParams,
    provider: Box<dyn NeighborProvider>,
}

impl std::fmt::Debug for EntropyEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyEstimator")
            .field("n", &self.reference.rows())
            .field("dimension", &self.reference.cols())
            .field("params", &self.params)
            .finish()
    }
}

impl EntropyEstimator {
    /// Validate `params` against `reference` and build the neighbor provider.
    pub fn new(reference: Matrix, params: EstimatorParams) -> Result<Self> {
        if reference.is_empty() {
            return Err(EntropyError::EmptyReference);
        }
        check_bandwidth(params.bandwidth)?;
        if params.nbrs == 0 {
            return Err(EntropyError::InvalidParameter(
                "nbrs must be greater than 0".to_string(),
            ));
        }
        if params.nbrs > reference.rows() {
            return Err(EntropyError::TooManyNeighbors {
                k: params.nbrs,
                n: reference.rows(),
            });
        }

        let provider = params.provider.build(&reference)?;
        debug!(
            n = reference.rows(),
            dimension = reference.cols(),
            bandwidth = params.bandwidth,
            nbrs = params.nbrs,
            kernel = %params.kernel,
            provider = %params.provider,
            metric = %params.metric,
            "built entropy estimator"
        );

        Ok(Self {
            reference,
            params,
            provider,
        })
    }

    /// Reference set size `n`.
    pub fn n(&self) -> usize {
        self.reference.rows()
    }

    pub fn reference(&self) -> &Matrix {
        &self.reference
    }

    pub fn params(&self) -> &EstimatorParams {
        &self.params
    }

    /// Sorted distances from each row of `y` to its `nbrs` nearest reference points.
    pub fn distances(&self, y: &Matrix) -> Result<Matrix> {
        self.provider.query(y, self.params.nbrs)
    }

    /// Neighbor distances divided by the bandwidth.
    pub fn zij(&self, y: &Matrix) -> Result<Matrix> {
        let h = self.params.bandwidth;
        Ok(self.distances(y)?.map(|d| d / h))
    }

    /// Pointwise entropy of each row of `y` relative to the reference set.
    pub fn delta_entropy(&self, y: &Matrix) -> Result<Vec<f64>> {
        let z = self.zij(y)?;
        Ok(self
            .params
            .kernel
            .log_density(&z)
            .into_iter()
            .map(|logp| -logp)
            .collect())
    }

    /// Entropy of `y` relative to the reference set, in nats.
    pub fn entropy(&self, y: &Matrix) -> Result<f64> {
        if y.is_empty() {
            return Err(EntropyError::InvalidParameter(
                "entropy of an empty query set is undefined".to_string(),
            ));
        }
        let delta = self.delta_entropy(y)?;
        let mean = delta.iter().sum::<f64>() / delta.len() as f64;
        Ok((self.n() as f64).ln() + mean)
    }

    /// Entropy of the reference set with respect to itself.
    pub fn dataset_entropy(&self) -> Result<f64> {
        self.entropy(&self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn uniform(rows: usize, cols: usize, seed: u64) -> Matrix {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..rows * cols).map(|_| rng.random::<f64>()).collect();
        Matrix::new(rows, cols, data).unwrap()
    }

    fn params(h: f64, nbrs: usize, kernel: Kernel, provider: ProviderKind) -> EstimatorParams {
        EstimatorParams {
            bandwidth: h,
            nbrs,
            kernel,
            provider,
            metric: Metric::Euclidean,
        }
    }

    #[test]
    fn construction_errors() {
        let x = uniform(10, 3, 1);
        assert_eq!(
            EntropyEstimator::new(Matrix::default(), EstimatorParams::default()).unwrap_err(),
            EntropyError::EmptyReference
        );
        assert!(matches!(
            EntropyEstimator::new(
                x.clone(),
                params(0.0, 5, Kernel::Gaussian, ProviderKind::BallTree)
            ),
            Err(EntropyError::InvalidBandwidth(_))
        ));
        assert!(matches!(
            EntropyEstimator::new(
                x.clone(),
                params(-1.0, 5, Kernel::Gaussian, ProviderKind::Brute)
            ),
            Err(EntropyError::InvalidBandwidth(_))
        ));
        assert_eq!(
            EntropyEstimator::new(x, params(0.1, 11, Kernel::Gaussian, ProviderKind::BallTree))
                .unwrap_err(),
            EntropyError::TooManyNeighbors { k: 11, n: 10 }
        );
        assert!(matches!(
            EstimatorParams::from_names(0.1, 5, "cosine-kde", "tree", "euclidean"),
            Err(EntropyError::UnknownKernel(_))
        ));
        assert!(matches!(
            EstimatorParams::from_names(0.1, 5, "gaussian", "faiss", "euclidean"),
            Err(EntropyError::UnknownProvider(_))
        ));
    }

    #[test]
    fn dataset_entropy_is_finite_and_deterministic() {
        let x = uniform(200, 4, 2);
        let p = params(0.1, 20, Kernel::Gaussian, ProviderKind::BallTree);
        let est = EntropyEstimator::new(x, p).unwrap();
        let a = est.dataset_entropy().unwrap();
        let b = est.dataset_entropy().unwrap();
        assert!(a.is_finite());
        assert_eq!(a, b);
        assert!(a <= (200.0_f64).ln() + 1e-12);
    }

    #[test]
    fn full_neighborhood_matches_perfect_entropy() {
        let x = uniform(60, 3, 3);
        let h = 0.2;
        let p = params(h, 60, Kernel::Gaussian, ProviderKind::BallTree);
        let est = EntropyEstimator::new(x.clone(), p).unwrap();
        let approx = est.dataset_entropy().unwrap();
        let exact = perfect_entropy(&x, h, 16).unwrap();
        assert!((approx - exact).abs() < 1e-8, "{approx} vs {exact}");
    }

    #[test]
    fn providers_agree() {
        let x = uniform(40, 5, 4);
        for kernel in [Kernel::Gaussian, Kernel::Epanechnikov] {
            let tree_params = params(0.3, 39, kernel, ProviderKind::BallTree);
            let brute_params = params(0.3, 39, kernel, ProviderKind::Brute);
            let tree = EntropyEstimator::new(x.clone(), tree_params).unwrap();
            let brute = EntropyEstimator::new(x.clone(), brute_params).unwrap();
            let a = tree.dataset_entropy().unwrap();
            let b = brute.dataset_entropy().unwrap();
            assert!((a - b).abs() < 1e-8, "{kernel}: {a} vs {b}");
        }
    }

    #[test]
    fn epanechnikov_saturates_outside_support() {
        let x = Matrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let p = params(0.1, 3, Kernel::Epanechnikov, ProviderKind::BallTree);
        let est = EntropyEstimator::new(x, p).unwrap();
        let y = Matrix::from_rows(&[vec![5.0, 5.0], vec![-3.0, 0.5]]).unwrap();
        for d in est.delta_entropy(&y).unwrap() {
            assert_eq!(d, -EPANECHNIKOV_EPS.ln());
        }
    }

    #[test]
    fn entropy_of_empty_query_fails() {
        let x = uniform(5, 2, 5);
        let est = EntropyEstimator::new(x, params(0.1, 2, Kernel::Gaussian, ProviderKind::Brute))
            .unwrap();
        assert!(est.entropy(&Matrix::zeros(0, 2)).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_dataset_entropy_permutation_invariant(seed in any::<u64>()) {
            let x = uniform(50, 3, seed);
            let mut order: Vec<usize> = (0..50).collect();
            order.shuffle(&mut StdRng::seed_from_u64(seed ^ 0x5eed));
            let shuffled = x.select_rows(&order);

            let p = params(0.15, 10, Kernel::Gaussian, ProviderKind::BallTree);
            let a = EntropyEstimator::new(x, p.clone()).unwrap().dataset_entropy().unwrap();
            let b = EntropyEstimator::new(shuffled, p).unwrap().dataset_entropy().unwrap();
            prop_assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
    }
}
