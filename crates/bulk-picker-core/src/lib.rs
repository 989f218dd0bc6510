//! Core types and image primitives for vision-guided bulk picking.
//!
//! Owned RGB and grayscale buffers, the classic operators the pickable-point
//! estimator chains together (HSV masking, Canny, 3×3 morphology, chamfer
//! distance transform, connected components), a four-point homography for
//! marker sampling, and the arm-frame [`Position`] value type.

mod color;
mod components;
mod distance;
mod edges;
mod homography;
mod image;
mod logger;
mod morphology;
mod position;

pub use color::{hue_mask, rgb_to_hsv, to_gray, to_hsv, HsvImage};
pub use components::{connected_components, label_components, ComponentLabels, ComponentStats};
pub use distance::{distance_transform, DistanceMap};
pub use edges::{canny, CannyParams};
pub use homography::{homography_from_quad, Homography};
pub use image::{ColorImage, GrayImage, GrayImageView};
pub use morphology::{apply_mask, close, dilate, erode, invert, open, union};
pub use position::Position;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_ENV};
