use crate::{fit_affine, AffineMap, CalibrationSample};
use log::{info, warn};
use nalgebra::Point2;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error("coordinate transformer is not calibrated")]
    NotCalibrated,
    #[error("need at least 3 calibration pairs, got {0}")]
    InsufficientSamples(usize),
    #[error("calibration image points are collinear")]
    DegenerateSamples,
    #[error("invalid model file {path}: {reason}")]
    InvalidModel { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Whether a model has been fitted or loaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModelState {
    Uncalibrated,
    Calibrated(AffineMap),
}

/// Affine image→arm mapping backed by a JSON file.
#[derive(Clone, Debug)]
pub struct CoordinateTransformer {
    path: PathBuf,
    state: ModelState,
}

impl CoordinateTransformer {
    /// Bind to `path`, loading the model if the file exists.
    ///
    /// A missing file leaves the transformer uncalibrated; an unreadable or
    /// malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TransformError> {
        let path = path.into();
        let state = if path.exists() {
            let map = load_model(&path)?;
            info!("loaded coordinate model from {}", path.display());
            ModelState::Calibrated(map)
        } else {
            warn!(
                "no coordinate model at {}; calibration required",
                path.display()
            );
            ModelState::Uncalibrated
        };
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.state, ModelState::Calibrated(_))
    }

    pub fn model(&self) -> Option<&AffineMap> {
        match &self.state {
            ModelState::Calibrated(map) => Some(map),
            ModelState::Uncalibrated => None,
        }
    }

    /// Refit from `samples` and overwrite the model file.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip_all, fields(samples = samples.len()))
    )]
    pub fn fit(&mut self, samples: &[CalibrationSample]) -> Result<&AffineMap, TransformError> {
        let map = fit_affine(samples)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&map)?)?;
        info!(
            "fitted coordinate model from {} pairs (rms {:.3} mm) -> {}",
            samples.len(),
            map.rms_residual,
            self.path.display()
        );
        self.state = ModelState::Calibrated(map);
        self.model().ok_or(TransformError::NotCalibrated)
    }

    /// Map an image point to arm XY.
    pub fn predict(&self, image_point: Point2<f64>) -> Result<Point2<f64>, TransformError> {
        self.model()
            .map(|m| m.apply(image_point))
            .ok_or(TransformError::NotCalibrated)
    }

    /// Per-pair distance between prediction and recorded arm position.
    pub fn residuals(&self, samples: &[CalibrationSample]) -> Result<Vec<f64>, TransformError> {
        let map = self.model().ok_or(TransformError::NotCalibrated)?;
        Ok(samples
            .iter()
            .map(|s| (map.apply(s.image) - s.robot).norm())
            .collect())
    }
}

fn load_model(path: &Path) -> Result<AffineMap, TransformError> {
    let raw = fs::read_to_string(path)?;
    let map: AffineMap = serde_json::from_str(&raw)?;
    if !map.is_finite() {
        return Err(TransformError::InvalidModel {
            path: path.to_path_buf(),
            reason: "non-finite coefficient".into(),
        });
    }
    Ok(map)
}
