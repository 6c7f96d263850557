//! Nearest-neighbor providers for the density estimate.
//!
//! The estimator only needs the sorted distances from each query point to
//! its `k` nearest reference points. Two interchangeable backends implement
//! [`NeighborProvider`]:
//!
//! - [`BallTree`]: exact search with sub-linear average query cost.
//! - [`BruteForce`]: full distance blocks; the reference for correctness.
//!
//! Backends are chosen by [`ProviderKind`], which is parsed from a name and
//! rejects unknown names before anything is built.

mod balltree;
mod brute;
mod traits;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use balltree::{BallTree, BallTreeParams};
pub use brute::{BruteForce, DEFAULT_QUERY_BATCH};
pub use traits::{NeighborProvider, ProviderStats};

use crate::error::{EntropyError, Result};
use crate::matrix::Matrix;

/// Available neighbor backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Ball tree (default).
    #[default]
    BallTree,
    /// Exhaustive distance blocks.
    Brute,
}

impl ProviderKind {
    /// Instantiate and build a provider over `reference`.
    pub fn build(self, reference: &Matrix) -> Result<Box<dyn NeighborProvider>> {
        let mut provider: Box<dyn NeighborProvider> = match self {
            ProviderKind::BallTree => Box::new(BallTree::new(BallTreeParams::default())?),
            ProviderKind::Brute => Box::new(BruteForce::new()),
        };
        provider.build(reference)?;
        Ok(provider)
    }
}

impl FromStr for ProviderKind {
    type Err = EntropyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "balltree" | "ball_tree" | "tree" => Ok(ProviderKind::BallTree),
            "brute" | "bruteforce" | "brute_force" => Ok(ProviderKind::Brute),
            _ => Err(EntropyError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::BallTree => write!(f, "balltree"),
            ProviderKind::Brute => write!(f, "brute"),
        }
    }
}

/// Shared argument validation for `NeighborProvider::query`.
pub(crate) fn check_query(
    built: bool,
    num_points: usize,
    dimension: usize,
    points: &Matrix,
    k: usize,
) -> Result<()> {
    if !built {
        return Err(EntropyError::InvalidParameter(
            "neighbor provider queried before build".to_string(),
        ));
    }
    if k == 0 {
        return Err(EntropyError::InvalidParameter(
            "neighbor count must be greater than 0".to_string(),
        ));
    }
    if k > num_points {
        return Err(EntropyError::TooManyNeighbors { k, n: num_points });
    }
    if !points.is_empty() && points.cols() != dimension {
        return Err(EntropyError::DimensionMismatch {
            expected: dimension,
            got: points.cols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse() {
        assert_eq!("Tree".parse::<ProviderKind>().unwrap(), ProviderKind::BallTree);
        assert_eq!("brute".parse::<ProviderKind>().unwrap(), ProviderKind::Brute);
        assert!(matches!(
            "annoy".parse::<ProviderKind>(),
            Err(EntropyError::UnknownProvider(name)) if name == "annoy"
        ));
    }

    #[test]
    fn build_by_kind() {
        let x = Matrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
        for kind in [ProviderKind::BallTree, ProviderKind::Brute] {
            let p = kind.build(&x).unwrap();
            assert_eq!(p.num_points(), 2);
            assert_eq!(p.stats().algorithm, kind.to_string());
        }
    }
}
