//! Canny edge detection (3×3 Sobel, L1 gradient magnitude, no pre-blur).

use crate::GrayImage;
use serde::{Deserialize, Serialize};

/// Hysteresis thresholds on the L1 gradient magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CannyParams {
    pub low: f32,
    pub high: f32,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            low: 100.0,
            high: 200.0,
        }
    }
}

const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

/// Edge map with edge pixels set to 255.
pub fn canny(img: &GrayImage, params: &CannyParams) -> GrayImage {
    let (w, h) = (img.width, img.height);
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let px = |x: isize, y: isize| -> i32 {
        let xc = x.clamp(0, w as isize - 1) as usize;
        let yc = y.clamp(0, h as isize - 1) as usize;
        img.data[yc * w + xc] as i32
    };

    let mut gx = vec![0i32; w * h];
    let mut gy = vec![0i32; w * h];
    let mut mag = vec![0i32; w * h];
    for y in 0..h as isize {
        for x in 0..w as isize {
            let dx = (px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x - 1, y) + px(x - 1, y + 1));
            let dy = (px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x, y - 1) + px(x + 1, y - 1));
            let i = y as usize * w + x as usize;
            gx[i] = dx;
            gy[i] = dy;
            mag[i] = dx.abs() + dy.abs();
        }
    }

    let m_at = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0
        } else {
            mag[y as usize * w + x as usize]
        }
    };

    // 0 = suppressed, 1 = weak, 2 = strong
    let mut class = vec![0u8; w * h];
    let mut stack = Vec::new();
    for y in 0..h as isize {
        for x in 0..w as isize {
            let i = y as usize * w + x as usize;
            let m = mag[i];
            if (m as f32) <= params.low {
                continue;
            }
            let ax = gx[i].abs() as f32;
            let ay = gy[i].abs() as f32;
            let is_max = if ay < ax * TAN_22_5 {
                m > m_at(x - 1, y) && m >= m_at(x + 1, y)
            } else if ay > ax * TAN_67_5 {
                m > m_at(x, y - 1) && m >= m_at(x, y + 1)
            } else {
                let s: isize = if (gx[i] < 0) != (gy[i] < 0) { -1 } else { 1 };
                m > m_at(x - s, y - 1) && m > m_at(x + s, y + 1)
            };
            if !is_max {
                continue;
            }
            if (m as f32) > params.high {
                class[i] = 2;
                stack.push(i);
            } else {
                class[i] = 1;
            }
        }
    }

    while let Some(i) = stack.pop() {
        out.data[i] = 255;
        let (x, y) = ((i % w) as isize, (i / w) as isize);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if class[j] == 1 {
                    class[j] = 2;
                    stack.push(j);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_has_no_edges() {
        let img = GrayImage::filled(16, 16, 90);
        assert_eq!(canny(&img, &CannyParams::default()).count_nonzero(), 0);
    }

    #[test]
    fn vertical_step_gives_one_pixel_line() {
        let mut img = GrayImage::new(12, 10);
        for y in 0..10 {
            for x in 6..12 {
                img.set(x, y, 150);
            }
        }
        let edges = canny(&img, &CannyParams::default());
        for y in 0..10 {
            let row: usize = (0..12).filter(|&x| edges.get(x, y) != 0).count();
            assert_eq!(row, 1, "row {y}");
        }
        assert_eq!(edges.get(5, 4), 255);
    }

    #[test]
    fn weak_step_below_low_threshold_is_ignored() {
        let mut img = GrayImage::new(12, 10);
        for y in 0..10 {
            for x in 6..12 {
                img.set(x, y, 20);
            }
        }
        assert_eq!(canny(&img, &CannyParams::default()).count_nonzero(), 0);
    }
}
