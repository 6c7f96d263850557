//! Estimator behavior on synthetic data with known structure.

use kdentropy::entropy::{diversity, perfect_entropy};
use kdentropy::sampling::{resample_entropy, SamplerParams};
use kdentropy::{EntropyError, EntropyEstimator, EstimatorParams, Kernel, Matrix, ProviderKind};

/// Two clusters of 50 points each, 0.01 wide and 10 apart.
fn two_clusters() -> Matrix {
    let rows: Vec<Vec<f64>> = (0..100)
        .map(|i| {
            let center = if i < 50 { -5.0 } else { 5.0 };
            vec![center + 0.0002 * (i % 50) as f64, 0.0]
        })
        .collect();
    Matrix::from_rows(&rows).unwrap()
}

fn full_estimator(x: Matrix, h: f64, provider: ProviderKind) -> EntropyEstimator {
    let n = x.rows();
    let params = EstimatorParams {
        bandwidth: h,
        nbrs: n,
        kernel: Kernel::Gaussian,
        provider,
        ..EstimatorParams::default()
    };
    EntropyEstimator::new(x, params).unwrap()
}

#[test]
fn entropy_falls_as_bandwidth_grows() {
    let x = two_clusters();
    let bandwidths = [1e-5, 1e-4, 1e-3, 1e-2, 1e-1, 1.0];
    let entropies: Vec<f64> = bandwidths
        .iter()
        .map(|&h| full_estimator(x.clone(), h, ProviderKind::BallTree).dataset_entropy().unwrap())
        .collect();

    for pair in entropies.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "not monotone: {entropies:?}");
    }
    // Every point resolved.
    assert!((entropies[0] - 100f64.ln()).abs() < 1e-6);
    // Each cluster collapses into one sample.
    assert!((entropies[5] - 2f64.ln()).abs() < 1e-3);
}

#[test]
fn full_neighborhood_matches_exact_entropy() {
    let x = two_clusters();
    for h in [1e-4, 1e-3, 1e-2] {
        let estimated = full_estimator(x.clone(), h, ProviderKind::Brute)
            .dataset_entropy()
            .unwrap();
        let exact = perfect_entropy(&x, h, 16).unwrap();
        assert!((estimated - exact).abs() < 1e-9, "h = {h}: {estimated} vs {exact}");
    }
}

#[test]
fn diversity_counts_clusters() {
    let x = two_clusters();
    assert!((diversity(&x, 1.0, 32).unwrap() - 2.0).abs() < 1e-3);
    assert!((diversity(&x, 1e-5, 32).unwrap() - 100.0).abs() < 1e-6);
}

#[test]
fn truncated_neighborhood_close_to_full_for_tight_kernel() {
    let x = two_clusters();
    let params = EstimatorParams {
        bandwidth: 1e-4,
        nbrs: 10,
        ..EstimatorParams::default()
    };
    let truncated = EntropyEstimator::new(x.clone(), params).unwrap().dataset_entropy().unwrap();
    let exact = perfect_entropy(&x, 1e-4, 100).unwrap();
    assert!((truncated - exact).abs() < 1e-6);
}

#[test]
fn names_resolve_or_fail_before_building() {
    assert!(EstimatorParams::from_names(0.1, 5, "gaussian", "tree", "l2").is_ok());
    assert!(matches!(
        EstimatorParams::from_names(0.1, 5, "triangular", "tree", "l2"),
        Err(EntropyError::UnknownKernel(_))
    ));
    assert!(matches!(
        EstimatorParams::from_names(0.1, 5, "gaussian", "kd_tree", "l2"),
        Err(EntropyError::UnknownProvider(_))
    ));
    assert!(matches!(
        EstimatorParams::from_names(0.1, 5, "gaussian", "tree", "cosine"),
        Err(EntropyError::UnknownMetric(_))
    ));
}

#[test]
fn construction_rejects_bad_settings() {
    let x = two_clusters();
    let too_many = EstimatorParams {
        nbrs: 101,
        ..EstimatorParams::default()
    };
    assert_eq!(
        EntropyEstimator::new(x.clone(), too_many).unwrap_err(),
        EntropyError::TooManyNeighbors { k: 101, n: 100 }
    );
    let bad_h = EstimatorParams {
        bandwidth: 0.0,
        nbrs: 5,
        ..EstimatorParams::default()
    };
    assert_eq!(
        EntropyEstimator::new(x, bad_h).unwrap_err(),
        EntropyError::InvalidBandwidth(0.0)
    );
}

#[test]
fn resampling_with_fixed_seed_is_reproducible() {
    let x = two_clusters();
    let params = SamplerParams {
        sample: Some(40),
        num_runs: 6,
        seed: 3,
        estimator: EstimatorParams {
            bandwidth: 1e-3,
            nbrs: 10,
            ..EstimatorParams::default()
        },
        ..SamplerParams::default()
    };
    let a = resample_entropy(&x, &params).unwrap();
    assert_eq!(a.len(), 6);
    assert_eq!(a, resample_entropy(&x, &params).unwrap());
    assert!(a.iter().all(|&e| e.is_finite() && e <= 40f64.ln() + 1e-9));
}
