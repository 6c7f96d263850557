//! Distance metric tag for estimator configuration.
//!
//! The kernel density estimate is defined on Euclidean distances: the
//! Gaussian kernel is `exp(-‖x−y‖²/2h²)` and the Epanechnikov kernel has
//! support `‖x−y‖ < h`. Every neighbor provider computes those distances
//! through [`crate::simd`]. [`Metric`] only names and validates the metric
//! in configuration files and reports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EntropyError;

/// Distance metric between descriptor vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Euclidean (L2) distance.
    #[default]
    Euclidean,
}

impl FromStr for Metric {
    type Err = EntropyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            _ => Err(EntropyError::UnknownMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Euclidean => write!(f, "euclidean"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_parses_aliases() {
        assert_eq!("euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!("L2".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert!(matches!(
            "cosine".parse::<Metric>(),
            Err(EntropyError::UnknownMetric(_))
        ));
    }

    #[test]
    fn metric_round_trips_through_its_name() {
        let name = Metric::Euclidean.to_string();
        assert_eq!(name, "euclidean");
        assert_eq!(name.parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!(serde_json::to_string(&Metric::Euclidean).unwrap(), "\"euclidean\"");
    }
}
