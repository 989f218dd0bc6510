//! Pickable-point estimation on bulk images.
//!
//! [`PickablePointEstimator::estimate_pickable_points`] isolates items of one
//! hue, separates touching items along their edges and returns the centroids
//! of the distance-transform cores, largest first.
//! [`PickablePointEstimator::adjust_estimated_point`] then slides a
//! suction-sized window around a candidate until it finds a patch free of
//! edges and background.

mod annotate;
mod estimator;
mod params;

pub use annotate::annotate_candidates;
pub use estimator::{PickCandidate, PickablePointEstimator};
pub use params::{AdjustParams, EstimatorParams, HueBand};
