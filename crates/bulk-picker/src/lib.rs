//! High-level facade for the `bulk-picker-*` workspace.
//!
//! A picking station is a suction arm, a camera looking down at a bin of
//! same-coloured items, and a one-dimensional distance sensor mounted next to
//! the suction tip. [`Picker`] ties them together:
//!
//! 1. capture a frame and rank pickable points on the items,
//! 2. map the chosen pixel into arm coordinates with a fitted affine model,
//! 3. measure the item height with the distance sensor,
//! 4. descend by the measured depth and grasp.
//!
//! Hardware lives behind the [`ArmDriver`], [`Camera`] and
//! [`DepthSampler`](sensor::DepthSampler) traits; [`Operator`] covers the
//! manual steps of camera-to-arm calibration.
//!
//! ## Quickstart
//!
//! ```no_run
//! use bulk_picker::{ImageFileCamera, Picker, PickerConfig};
//! use bulk_picker::sensor::SerialDepthSampler;
//! # use bulk_picker::{ArmDriver, ArmError, MotionMode};
//! # use bulk_picker::core::Position;
//! # struct MyArm;
//! # impl ArmDriver for MyArm {
//! #     fn connect(&mut self) -> Result<(), ArmError> { Ok(()) }
//! #     fn disconnect(&mut self) -> Result<(), ArmError> { Ok(()) }
//! #     fn move_to(&mut self, _: Position, _: MotionMode, _: bool) -> Result<(), ArmError> { Ok(()) }
//! #     fn current_pose(&mut self) -> Result<Position, ArmError> { Ok(Position::default()) }
//! #     fn set_suction(&mut self, _: bool) -> Result<(), ArmError> { Ok(()) }
//! #     fn set_gripper(&mut self, _: bool) -> Result<(), ArmError> { Ok(()) }
//! #     fn set_home(&mut self, _: Position) -> Result<(), ArmError> { Ok(()) }
//! # }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PickerConfig::load_json("picker.json")?;
//! let sensor = SerialDepthSampler::new(config.sensor.clone());
//! let camera = ImageFileCamera::single("bulk.png");
//! let mut picker = Picker::new(MyArm, camera, sensor, config)?;
//! picker.activate()?;
//! let outcome = picker.pick_from_bulk(0.0)?;
//! println!("grasped at {:?}", outcome.grasp);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `bulk_picker::core`: image buffers, classic operators, [`Position`](core::Position).
//! - `bulk_picker::estimator`: pickable-point estimation and window adjustment.
//! - `bulk_picker::aruco`: marker dictionaries and quad detection for calibration.
//! - `bulk_picker::transform`: image-to-arm affine model with JSON persistence.
//! - `bulk_picker::sensor`: serial distance sensor and reading reduction.

pub use bulk_picker_aruco as aruco;
pub use bulk_picker_core as core;
pub use bulk_picker_estimator as estimator;
pub use bulk_picker_sensor as sensor;
pub use bulk_picker_transform as transform;

mod arm;
mod camera;
mod config;
mod error;
#[cfg(feature = "image")]
mod file_camera;
mod geometry;
mod operator;
mod picker;

pub use arm::{ArmDriver, ArmError, MotionMode};
pub use camera::{Camera, CameraError, CameraSettings};
pub use config::{ConfigError, MotionConfig, PickerConfig};
pub use error::PickingError;
#[cfg(feature = "image")]
pub use file_camera::{
    color_from_rgb, load_color_image, rgb_from_color, save_color_image, ImageFileCamera,
};
pub use geometry::{measuring_position, SensorDisplacement};
pub use operator::{Operator, OperatorError, PromptOperator, StdinOperator};
pub use picker::{PickOutcome, Picker};
