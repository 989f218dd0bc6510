//! Image-file backed camera and conversions to and from the `image` crate.

use crate::{Camera, CameraError, CameraSettings};
use bulk_picker_core::ColorImage;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Convert an `image` RGB buffer into a [`ColorImage`].
pub fn color_from_rgb(img: &image::RgbImage) -> ColorImage {
    ColorImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Convert a [`ColorImage`] into an `image` RGB buffer.
pub fn rgb_from_color(img: &ColorImage) -> Result<image::RgbImage, CameraError> {
    image::RgbImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
        .ok_or_else(|| CameraError::InvalidFrame("buffer length does not match size".into()))
}

/// Decode any supported image file as RGB.
pub fn load_color_image(path: impl AsRef<Path>) -> Result<ColorImage, CameraError> {
    let img = image::open(path.as_ref())?.to_rgb8();
    Ok(color_from_rgb(&img))
}

/// Encode `img` to a file; the format follows the extension.
pub fn save_color_image(img: &ColorImage, path: impl AsRef<Path>) -> Result<(), CameraError> {
    rgb_from_color(img)?.save(path.as_ref())?;
    Ok(())
}

/// Serves frames from image files, for dry runs without hardware.
#[derive(Clone, Debug)]
pub struct ImageFileCamera {
    frames: Vec<PathBuf>,
    next: usize,
    repeat: bool,
}

impl ImageFileCamera {
    /// Frames are returned in order; the last one is served again if `repeat`.
    pub fn new(frames: Vec<PathBuf>, repeat: bool) -> Self {
        Self {
            frames,
            next: 0,
            repeat,
        }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self::new(vec![path.into()], true)
    }
}

impl Camera for ImageFileCamera {
    fn configure(&mut self, settings: &CameraSettings) -> Result<(), CameraError> {
        if self.frames.is_empty() {
            return Err(CameraError::Unavailable("no image files given".into()));
        }
        debug!(
            "file camera ignores capture settings ({}x{} @ {} fps)",
            settings.width, settings.height, settings.fps
        );
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<ColorImage, CameraError> {
        let idx = if self.next < self.frames.len() {
            self.next
        } else if self.repeat && !self.frames.is_empty() {
            self.frames.len() - 1
        } else {
            return Err(CameraError::Exhausted);
        };
        self.next += 1;
        let path = &self.frames[idx];
        let frame = load_color_image(path)?;
        if frame.width == 0 || frame.height == 0 {
            warn!("empty frame in {}", path.display());
        }
        Ok(frame)
    }
}
