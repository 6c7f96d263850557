//! Clustering used by the baseline selectors.

mod dbscan;
mod kmeans;

pub use dbscan::dbscan_labels;
pub use kmeans::KMeans;
