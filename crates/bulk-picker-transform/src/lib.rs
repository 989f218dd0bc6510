//! Image-to-arm coordinate mapping.
//!
//! A [`CoordinateTransformer`] owns one JSON model file. The model is an affine
//! map fitted by least squares over `(image point, arm point)` pairs collected
//! during calibration; every [`CoordinateTransformer::fit`] overwrites the
//! file wholesale.

mod affine;
mod transformer;

pub use affine::{fit_affine, AffineMap, CalibrationSample};
pub use transformer::{CoordinateTransformer, ModelState, TransformError};
