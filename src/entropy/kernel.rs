//! Density kernels applied to normalized neighbor distances.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EntropyError;
use crate::matrix::{logsumexp_rows_stable, Matrix};

/// Floor added to the Epanechnikov kernel sum so `ln` stays finite when no
/// neighbor falls inside the support.
pub const EPANECHNIKOV_EPS: f64 = 1e-15;

/// Kernel used for the density estimate.
///
/// Both kernels take `z = d / h` (points × neighbors) and return one
/// unnormalized log-density per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// `ln Σ_j exp(−z_j²/2)`.
    #[default]
    Gaussian,
    /// `ln(Σ_j (1 − min(z_j², 1)) + ε)`.
    Epanechnikov,
}

impl Kernel {
    /// Log-density of every row of `z`.
    #[must_use]
    pub fn log_density(self, z: &Matrix) -> Vec<f64> {
        match self {
            Kernel::Gaussian => logsumexp_rows_stable(&z.map(|v| -(v * v) / 2.0)),
            Kernel::Epanechnikov => z
                .iter_rows()
                .map(|row| {
                    let sum: f64 = row.iter().map(|&v| 1.0 - (v * v).min(1.0)).sum();
                    (sum + EPANECHNIKOV_EPS).ln()
                })
                .collect(),
        }
    }
}

impl FromStr for Kernel {
    type Err = EntropyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(Kernel::Gaussian),
            "epanechnikov" => Ok(Kernel::Epanechnikov),
            _ => Err(EntropyError::UnknownKernel(s.to_string())),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Gaussian => write!(f, "gaussian"),
            Kernel::Epanechnikov => write!(f, "epanechnikov"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_of_zero_distance_is_log_count() {
        let z = Matrix::new(1, 4, vec![0.0; 4]).unwrap();
        let ld = Kernel::Gaussian.log_density(&z);
        assert!((ld[0] - 4.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn gaussian_far_neighbors_stay_finite() {
        let z = Matrix::new(1, 2, vec![60.0, 61.0]).unwrap();
        let ld = Kernel::Gaussian.log_density(&z);
        assert!(ld[0].is_finite());
        assert!((ld[0] - (-1800.0 + (1.0 + (-60.5_f64).exp()).ln())).abs() < 1e-9);
    }

    #[test]
    fn epanechnikov_support() {
        let z = Matrix::from_rows(&[vec![0.0, 0.5, 2.0], vec![1.0, 3.0, 1.5]]).unwrap();
        let ld = Kernel::Epanechnikov.log_density(&z);
        assert!((ld[0] - (1.75 + EPANECHNIKOV_EPS).ln()).abs() < 1e-12);
        assert_eq!(ld[1], EPANECHNIKOV_EPS.ln());
    }

    #[test]
    fn kernel_names() {
        assert_eq!("Gaussian".parse::<Kernel>().unwrap(), Kernel::Gaussian);
        assert_eq!("epanechnikov".parse::<Kernel>().unwrap(), Kernel::Epanechnikov);
        assert!(matches!("tophat".parse::<Kernel>(), Err(EntropyError::UnknownKernel(_))));
    }
}
