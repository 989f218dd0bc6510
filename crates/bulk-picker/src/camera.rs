//! Bulk camera boundary.

use bulk_picker_core::ColorImage;
use serde::{Deserialize, Serialize};

/// Capture settings applied before every bulk frame.
///
/// Exposure and white balance are fixed so the hue band stays stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// USB product id of the bulk camera, when the driver discovers it.
    pub usb_pid: Option<u16>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub auto_exposure: bool,
    /// Absolute exposure time in driver units.
    pub exposure: u32,
    pub auto_white_balance: bool,
    /// White balance temperature in kelvin.
    pub white_balance: u32,
    pub saturation: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            usb_pid: None,
            width: 640,
            height: 480,
            fps: 30,
            auto_exposure: false,
            exposure: 500,
            auto_white_balance: false,
            white_balance: 3000,
            saturation: 60,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("no more frames")]
    Exhausted,
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Source of RGB frames of the bulk area.
pub trait Camera {
    fn configure(&mut self, settings: &CameraSettings) -> Result<(), CameraError>;
    fn capture_frame(&mut self) -> Result<ColorImage, CameraError>;
}
