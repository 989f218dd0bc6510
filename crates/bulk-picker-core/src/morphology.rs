//! Binary mask arithmetic and 3×3 morphology.
//!
//! The structuring element is always the full 3×3 square. Pixels outside the
//! image never take part in a min/max, so borders neither erode nor grow.

use crate::GrayImage;

/// Bitwise NOT.
pub fn invert(img: &GrayImage) -> GrayImage {
    GrayImage {
        width: img.width,
        height: img.height,
        data: img.data.iter().map(|&v| !v).collect(),
    }
}

/// Keep `img` where `mask` is non-zero, zero elsewhere.
pub fn apply_mask(img: &GrayImage, mask: &GrayImage) -> GrayImage {
    debug_assert_eq!((img.width, img.height), (mask.width, mask.height));
    GrayImage {
        width: img.width,
        height: img.height,
        data: img
            .data
            .iter()
            .zip(&mask.data)
            .map(|(&v, &m)| if m != 0 { v } else { 0 })
            .collect(),
    }
}

/// Bitwise OR of two same-sized images.
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!((a.width, a.height), (b.width, b.height));
    GrayImage {
        width: a.width,
        height: a.height,
        data: a.data.iter().zip(&b.data).map(|(&x, &y)| x | y).collect(),
    }
}

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

fn filter3x3(img: &GrayImage, op: Extremum) -> GrayImage {
    let (w, h) = (img.width, img.height);
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        for x in 0..w {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            let mut acc = match op {
                Extremum::Min => u8::MAX,
                Extremum::Max => u8::MIN,
            };
            for yy in y0..=y1 {
                for &v in &img.data[yy * w + x0..=yy * w + x1] {
                    acc = match op {
                        Extremum::Min => acc.min(v),
                        Extremum::Max => acc.max(v),
                    };
                }
            }
            out.data[y * w + x] = acc;
        }
    }
    out
}

pub fn erode(img: &GrayImage, iterations: usize) -> GrayImage {
    (0..iterations).fold(img.clone(), |acc, _| filter3x3(&acc, Extremum::Min))
}

pub fn dilate(img: &GrayImage, iterations: usize) -> GrayImage {
    (0..iterations).fold(img.clone(), |acc, _| filter3x3(&acc, Extremum::Max))
}

/// Dilate `iterations` times, then erode as many times.
pub fn close(img: &GrayImage, iterations: usize) -> GrayImage {
    erode(&dilate(img, iterations), iterations)
}

/// Erode `iterations` times, then dilate as many times.
pub fn open(img: &GrayImage, iterations: usize) -> GrayImage {
    dilate(&erode(img, iterations), iterations)
}
