use crate::TransformError;
use nalgebra::{DMatrix, Point2};
use serde::{Deserialize, Serialize};

/// One calibration pair: where a marker was seen and where the arm reached it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    /// Pixel coordinates in the bulk frame.
    pub image: Point2<f64>,
    /// Arm-frame XY in millimetres.
    pub robot: Point2<f64>,
}

impl CalibrationSample {
    pub fn new(image: Point2<f64>, robot: Point2<f64>) -> Self {
        Self { image, robot }
    }
}

/// `robot = A · [u, v, 1]ᵀ` with a 2×3 coefficient matrix `A`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineMap {
    /// Rows map to robot x and y; columns weigh u, v and the intercept.
    pub coefficients: [[f64; 3]; 2],
    /// Root-mean-square residual over the training pairs, in millimetres.
    pub rms_residual: f64,
}

impl AffineMap {
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let [a, b] = self.coefficients;
        Point2::new(
            a[0] * p.x + a[1] * p.y + a[2],
            b[0] * p.x + b[1] * p.y + b[2],
        )
    }

    pub fn is_finite(&self) -> bool {
        self.coefficients.iter().flatten().all(|c| c.is_finite())
            && self.rms_residual.is_finite()
    }
}

/// Least-squares affine fit with intercept.
///
/// Needs at least three pairs whose image points span the plane.
pub fn fit_affine(samples: &[CalibrationSample]) -> Result<AffineMap, TransformError> {
    let n = samples.len();
    if n < 3 {
        return Err(TransformError::InsufficientSamples(n));
    }

    let design = DMatrix::from_fn(n, 3, |r, c| match c {
        0 => samples[r].image.x,
        1 => samples[r].image.y,
        _ => 1.0,
    });
    let targets = DMatrix::from_fn(n, 2, |r, c| {
        if c == 0 {
            samples[r].robot.x
        } else {
            samples[r].robot.y
        }
    });

    let svd = design.svd(true, true);
    let max_sv = svd.singular_values.max();
    let eps = max_sv * 1e-10;
    if max_sv <= 0.0 || svd.rank(eps) < 3 {
        return Err(TransformError::DegenerateSamples);
    }
    let solution = svd
        .solve(&targets, eps)
        .map_err(|_| TransformError::DegenerateSamples)?;

    let mut map = AffineMap {
        coefficients: [
            [solution[(0, 0)], solution[(1, 0)], solution[(2, 0)]],
            [solution[(0, 1)], solution[(1, 1)], solution[(2, 1)]],
        ],
        rms_residual: 0.0,
    };
    let sq: f64 = samples
        .iter()
        .map(|s| (map.apply(s.image) - s.robot).norm_squared())
        .sum();
    map.rms_residual = (sq / n as f64).sqrt();

    if !map.is_finite() {
        return Err(TransformError::DegenerateSamples);
    }
    Ok(map)
}
