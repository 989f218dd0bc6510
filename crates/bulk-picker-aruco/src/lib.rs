//! Square fiducial marker detection for camera-to-arm calibration.
//!
//! The calibration helper lays printed markers on the work surface, detects
//! them in one bulk frame and pairs each marker centre with the arm position
//! the operator jogs to. This crate covers the vision half:
//!
//! - [`Dictionary`]: code table loaded from JSON,
//! - [`Matcher`]: rotation-aware Hamming lookup,
//! - [`MarkerDetector`]: threshold, trace, simplify, decode.
//!
//! ```no_run
//! use bulk_picker_aruco::{Dictionary, MarkerDetector, MarkerDetectorParams};
//! use bulk_picker_core::GrayImage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dict = Dictionary::load_json("dict_6x6_250.json")?;
//! let detector = MarkerDetector::new(dict, MarkerDetectorParams::default());
//! let frame = GrayImage::new(640, 480);
//! for (id, center) in detector.detect_markers(&frame.view()) {
//!     println!("{id}: {center}");
//! }
//! # Ok(())
//! # }
//! ```

mod contour;
mod decode;
mod detect;
mod dictionary;
mod matcher;
mod threshold;

pub use contour::{approx_polygon_closed, trace_outer_boundary};
pub use decode::{DecodeParams, MarkerDetection, QuadDecoder};
pub use detect::{MarkerDetector, MarkerDetectorParams};
pub use dictionary::{Dictionary, DictionaryError};
pub use matcher::{rotate_code_u64, Match, Matcher};
pub use threshold::adaptive_threshold_inv;
