use crate::{ArmError, CameraError, ConfigError, OperatorError};
use bulk_picker_aruco::DictionaryError;
use bulk_picker_sensor::SensorError;
use bulk_picker_transform::TransformError;

#[derive(thiserror::Error, Debug)]
pub enum PickingError {
    #[error("there are no pickable items")]
    NoPickableItem,
    #[error("no calibration markers detected")]
    NoMarkers,
    #[error("no marker dictionary configured")]
    NoDictionary,
    #[error(transparent)]
    Arm(#[from] ArmError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Operator(#[from] OperatorError),
}

impl PickingError {
    /// The coordinate model has not been fitted or loaded yet.
    pub fn is_not_calibrated(&self) -> bool {
        matches!(self, Self::Transform(TransformError::NotCalibrated))
    }

    /// The distance sensor could not be located.
    pub fn is_sensor_not_found(&self) -> bool {
        matches!(self, Self::Sensor(SensorError::SensorNotFound { .. }))
    }

    /// The arm refused the connection.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Arm(ArmError::ConnectionFailure(_)))
    }
}
