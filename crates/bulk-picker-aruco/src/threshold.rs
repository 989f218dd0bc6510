//! Binarization for quad finding and bit reading.

use bulk_picker_core::{GrayImage, GrayImageView};

/// Otsu threshold over a sample set.
///
/// Flat input returns its only value; two-level input returns the midpoint.
pub(crate) fn otsu_threshold(samples: &[u8]) -> u8 {
    let Some((&lo, &hi)) = samples.iter().min().zip(samples.iter().max()) else {
        return 127;
    };
    if lo == hi {
        return lo;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    if hist.iter().filter(|&&c| c > 0).count() <= 2 {
        return ((lo as u16 + hi as u16) / 2) as u8;
    }

    let total = samples.len() as f64;
    let weighted_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum();

    let (mut w_back, mut sum_back) = (0f64, 0f64);
    let (mut best_t, mut best_var) = (127u8, -1f64);
    for (t, &c) in hist.iter().enumerate() {
        w_back += c as f64;
        if w_back < 1.0 {
            continue;
        }
        let w_fore = total - w_back;
        if w_fore < 1.0 {
            break;
        }
        sum_back += t as f64 * c as f64;
        let diff = sum_back / w_back - (weighted_total - sum_back) / w_fore;
        let var = w_back * w_fore * diff * diff;
        if var > best_var {
            best_var = var;
            best_t = t as u8;
        }
    }
    best_t
}

/// Local-mean inverted threshold.
///
/// A pixel becomes 255 when it is at most `mean - offset`, where `mean` is
/// taken over the `(2r+1)²` window clipped to the image. Dark ink on light
/// paper therefore ends up as foreground.
pub fn adaptive_threshold_inv(src: &GrayImageView<'_>, radius: usize, offset: i32) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    // integral image with a zero row/column in front
    let stride = w + 1;
    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        let mut row = 0u64;
        for x in 0..w {
            row += src.data[y * w + x] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row;
        }
    }

    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(w);
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let n = ((x1 - x0) * (y1 - y0)) as f64;
            let limit = sum as f64 / n - offset as f64;
            if (src.data[y * w + x] as f64) <= limit {
                out.data[y * w + x] = 255;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_separates_two_clusters() {
        let mut samples = vec![10u8, 12, 14, 16];
        samples.extend([200u8, 205, 210, 215]);
        let t = otsu_threshold(&samples);
        assert!((16..200).contains(&t), "t={t}");
    }

    #[test]
    fn otsu_edge_cases() {
        assert_eq!(otsu_threshold(&[]), 127);
        assert_eq!(otsu_threshold(&[42, 42, 42]), 42);
        assert_eq!(otsu_threshold(&[0, 255, 0]), 127);
    }

    #[test]
    fn dark_square_on_paper_is_foreground() {
        let mut img = GrayImage::filled(40, 40, 230);
        for y in 15..25 {
            for x in 15..25 {
                img.set(x, y, 20);
            }
        }
        let bin = adaptive_threshold_inv(&img.view(), 10, 7);
        assert_eq!(bin.get(15, 15), 255);
        assert_eq!(bin.get(20, 20), 255);
        assert_eq!(bin.get(2, 2), 0);
        assert_eq!(bin.get(30, 20), 0);
    }

    #[test]
    fn flat_image_has_no_foreground() {
        let img = GrayImage::filled(16, 16, 128);
        assert_eq!(adaptive_threshold_inv(&img.view(), 3, 7).count_nonzero(), 0);
    }
}
