//! Chamfer distance transform.

use crate::GrayImage;

// 3×3 chamfer weights approximating the Euclidean metric.
const AXIAL: f32 = 0.955;
const DIAGONAL: f32 = 1.3693;

/// Per-pixel distance to the nearest zero pixel.
#[derive(Clone, Debug)]
pub struct DistanceMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl DistanceMap {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    /// Binary image (255/0) of pixels strictly above `thresh`.
    pub fn threshold(&self, thresh: f32) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|&d| if d > thresh { 255 } else { 0 })
                .collect(),
        }
    }
}

/// Two-pass 3×3 chamfer transform of a binary image.
///
/// Zero pixels are sources. Pixels outside the image are not sources, so a
/// region touching the border measures only towards interior zeros. Pixels
/// with no reachable zero keep `f32::MAX`.
pub fn distance_transform(img: &GrayImage) -> DistanceMap {
    let (w, h) = (img.width, img.height);
    let mut d: Vec<f32> = img
        .data
        .iter()
        .map(|&v| if v == 0 { 0.0 } else { f32::MAX })
        .collect();

    let relax = |d: &mut [f32], i: usize, j: usize, cost: f32| {
        let cand = d[j] + cost;
        if cand < d[i] {
            d[i] = cand;
        }
    };

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if d[i] == 0.0 {
                continue;
            }
            if x > 0 {
                relax(&mut d, i, i - 1, AXIAL);
            }
            if y > 0 {
                relax(&mut d, i, i - w, AXIAL);
                if x > 0 {
                    relax(&mut d, i, i - w - 1, DIAGONAL);
                }
                if x + 1 < w {
                    relax(&mut d, i, i - w + 1, DIAGONAL);
                }
            }
        }
    }

    for y in (0..h).rev() {
        for x in (0..w).rev() {
            let i = y * w + x;
            if d[i] == 0.0 {
                continue;
            }
            if x + 1 < w {
                relax(&mut d, i, i + 1, AXIAL);
            }
            if y + 1 < h {
                relax(&mut d, i, i + w, AXIAL);
                if x + 1 < w {
                    relax(&mut d, i, i + w + 1, DIAGONAL);
                }
                if x > 0 {
                    relax(&mut d, i, i + w - 1, DIAGONAL);
                }
            }
        }
    }

    DistanceMap {
        width: w,
        height: h,
        data: d,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn single_source_distances() {
        let mut img = GrayImage::filled(5, 5, 255);
        img.set(2, 2, 0);
        let dm = distance_transform(&img);
        assert_eq!(dm.get(2, 2), 0.0);
        assert_relative_eq!(dm.get(3, 2), AXIAL);
        assert_relative_eq!(dm.get(3, 3), DIAGONAL);
        assert_relative_eq!(dm.get(4, 2), 2.0 * AXIAL);
    }

    #[test]
    fn square_peaks_at_center() {
        let mut img = GrayImage::new(11, 11);
        for y in 1..10 {
            for x in 1..10 {
                img.set(x, y, 255);
            }
        }
        let dm = distance_transform(&img);
        let max = dm.max();
        assert_relative_eq!(dm.get(5, 5), max);
        assert_relative_eq!(max, 5.0 * AXIAL, epsilon = 1e-5);

        let core = dm.threshold(0.5 * max);
        assert_eq!(core.get(5, 5), 255);
        assert_eq!(core.get(1, 1), 0);
    }

    #[test]
    fn no_sources_stay_unreached() {
        let dm = distance_transform(&GrayImage::filled(3, 3, 1));
        assert_eq!(dm.max(), f32::MAX);
    }
}
