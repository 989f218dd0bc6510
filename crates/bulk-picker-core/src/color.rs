//! Color-space conversions and hue masking.

use crate::{ColorImage, GrayImage};

/// 8-bit HSV image, interleaved `[h, s, v]`.
///
/// Hue uses the half-degree convention (`0..180`) so it fits in a byte;
/// saturation and value span `0..=255`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HsvImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl HsvImage {
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Luma with the ITU-R BT.601 weights.
pub fn to_gray(img: &ColorImage) -> GrayImage {
    let data = img
        .data
        .chunks_exact(3)
        .map(|p| {
            let l = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
            l.round().clamp(0.0, 255.0) as u8
        })
        .collect();
    GrayImage {
        width: img.width,
        height: img.height,
        data,
    }
}

#[inline]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { diff / v * 255.0 } else { 0.0 };

    let h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round().clamp(0.0, 255.0) as u8,
        v as u8,
    ]
}

pub fn to_hsv(img: &ColorImage) -> HsvImage {
    let mut data = Vec::with_capacity(img.data.len());
    for p in img.data.chunks_exact(3) {
        data.extend_from_slice(&rgb_to_hsv([p[0], p[1], p[2]]));
    }
    HsvImage {
        width: img.width,
        height: img.height,
        data,
    }
}

/// Binary mask (255/0) of pixels whose hue lies in `lower..=upper`.
///
/// Saturation and value are not constrained.
pub fn hue_mask(hsv: &HsvImage, lower: u8, upper: u8) -> GrayImage {
    let data = hsv
        .data
        .chunks_exact(3)
        .map(|p| if (lower..=upper).contains(&p[0]) { 255 } else { 0 })
        .collect();
    GrayImage {
        width: hsv.width,
        height: hsv.height,
        data,
    }
}
