//! Connected-component labelling with per-component statistics.

use crate::GrayImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Bounding box, pixel area and centroid of one foreground component.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    /// 1-based label; 0 is the background and is never reported.
    pub label: u32,
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
    pub area: usize,
    pub centroid: Point2<f64>,
}

/// Per-pixel label map plus the stats of every labelled component.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentLabels {
    pub width: usize,
    pub height: usize,
    /// Row-major labels; 0 is background, `k` refers to `stats[k - 1]`.
    pub labels: Vec<u32>,
    pub stats: Vec<ComponentStats>,
}

impl ComponentLabels {
    #[inline]
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }
}

/// Label 8-connected non-zero regions.
///
/// Labels are assigned in raster order of each component's first pixel and
/// the returned stats follow that order.
pub fn connected_components(img: &GrayImage) -> Vec<ComponentStats> {
    label_components(img).stats
}

/// Same as [`connected_components`] but keeps the label map.
pub fn label_components(img: &GrayImage) -> ComponentLabels {
    let (w, h) = (img.width, img.height);
    let mut labels = vec![0u32; w * h];
    let mut out = Vec::new();
    let mut stack = Vec::new();

    for seed in 0..w * h {
        if img.data[seed] == 0 || labels[seed] != 0 {
            continue;
        }
        let label = out.len() as u32 + 1;
        labels[seed] = label;
        stack.push(seed);

        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        let (mut sum_x, mut sum_y) = (0f64, 0f64);
        let mut area = 0usize;

        while let Some(i) = stack.pop() {
            let (x, y) = (i % w, i / w);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            sum_x += x as f64;
            sum_y += y as f64;
            area += 1;

            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    let j = ny * w + nx;
                    if img.data[j] != 0 && labels[j] == 0 {
                        labels[j] = label;
                        stack.push(j);
                    }
                }
            }
        }

        out.push(ComponentStats {
            label,
            left: min_x,
            top: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
            area,
            centroid: Point2::new(sum_x / area as f64, sum_y / area as f64),
        });
    }

    ComponentLabels {
        width: w,
        height: h,
        labels,
        stats: out,
    }
}
