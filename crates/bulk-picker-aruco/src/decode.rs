//! Bit-grid decoding through a detected quadrilateral.

use crate::threshold::otsu_threshold;
use crate::Matcher;
use bulk_picker_core::{homography_from_quad, GrayImageView, Homography};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Bit sampling configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeParams {
    /// Marker border width in cells.
    pub border_bits: usize,
    /// Fraction of the marker side ignored along each edge before sampling.
    pub inset_frac: f32,
    /// Minimum fraction of border cells that must read black.
    pub min_border_score: f32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            border_bits: 1,
            inset_frac: 0.0,
            min_border_score: 0.85,
        }
    }
}

/// One decoded marker in image coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: u32,
    /// Outer corners, clockwise in image coordinates starting near the top-left.
    pub corners: [Point2<f32>; 4],
    /// Mean of the four corners.
    pub center: Point2<f32>,
    pub rotation: u8,
    pub hamming: u8,
    /// Border score scaled by the Hamming penalty, `0..=1`.
    pub score: f32,
    /// Observed inner bits (row-major, black = 1).
    pub code: u64,
    /// Whether the quad read with swapped polarity.
    pub inverted: bool,
}

#[derive(Clone, Copy, Debug)]
struct Observation {
    code: u64,
    border_score: f32,
    inverted: bool,
}

/// Side of the canonical marker square the sample grid is laid out on.
const CANONICAL_CELL_PX: f32 = 8.0;
const THRESH_SUBDIV: usize = 3;

/// Sample positions of one marker in canonical coordinates.
struct SampleGrid {
    cells: usize,
    side: f32,
    bits: Vec<Point2<f32>>,
    threshold: Vec<Point2<f32>>,
}

impl SampleGrid {
    fn new(params: &DecodeParams, marker_size: usize) -> Option<Self> {
        let cells = marker_size + 2 * params.border_bits;
        if cells == 0 || marker_size * marker_size > 64 {
            return None;
        }
        let side = cells as f32 * CANONICAL_CELL_PX;
        let inset = (params.inset_frac.clamp(0.0, 0.4) * side).max(0.0);
        let inner = side - 2.0 * inset;

        let grid_points = |n: usize| {
            let step = inner / n as f32;
            (0..n)
                .flat_map(move |y| {
                    (0..n).map(move |x| {
                        Point2::new(
                            inset + (x as f32 + 0.5) * step,
                            inset + (y as f32 + 0.5) * step,
                        )
                    })
                })
                .collect::<Vec<_>>()
        };

        Some(Self {
            cells,
            side,
            bits: grid_points(cells),
            threshold: grid_points(cells * THRESH_SUBDIV),
        })
    }

    fn square(&self) -> [Point2<f32>; 4] {
        let s = self.side;
        [
            Point2::new(0.0, 0.0),
            Point2::new(s, 0.0),
            Point2::new(s, s),
            Point2::new(0.0, s),
        ]
    }
}

/// Decodes quads against one dictionary.
pub struct QuadDecoder<'a> {
    params: &'a DecodeParams,
    matcher: &'a Matcher,
    grid: SampleGrid,
    scratch_bits: Vec<u8>,
    scratch_thr: Vec<u8>,
}

impl<'a> QuadDecoder<'a> {
    pub fn new(params: &'a DecodeParams, matcher: &'a Matcher) -> Option<Self> {
        let grid = SampleGrid::new(params, matcher.dictionary().marker_size)?;
        Some(Self {
            params,
            matcher,
            scratch_bits: Vec::with_capacity(grid.bits.len()),
            scratch_thr: Vec::with_capacity(grid.threshold.len()),
            grid,
        })
    }

    /// Read the bit grid inside `corners` (clockwise, image pixels) and match it.
    pub fn decode(
        &mut self,
        img: &GrayImageView<'_>,
        corners: &[Point2<f32>; 4],
    ) -> Option<MarkerDetection> {
        let h = homography_from_quad(&self.grid.square(), corners)?;
        let obs = self.observe(img, &h)?;
        let m = self.matcher.match_code(obs.code)?;

        let bits = self.matcher.dictionary().bit_count().max(1) as f32;
        let score = (obs.border_score * (1.0 - m.hamming as f32 / bits)).clamp(0.0, 1.0);
        let center = Point2::from(
            corners
                .iter()
                .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords)
                / 4.0,
        );

        Some(MarkerDetection {
            id: m.id,
            corners: *corners,
            center,
            rotation: m.rotation,
            hamming: m.hamming,
            score,
            code: obs.code,
            inverted: obs.inverted,
        })
    }

    fn observe(&mut self, img: &GrayImageView<'_>, h: &Homography) -> Option<Observation> {
        self.scratch_bits.clear();
        for p in &self.grid.bits {
            let q = h.apply(*p);
            self.scratch_bits.push(mean_3x3(img, q.x, q.y)?);
        }

        self.scratch_thr.clear();
        for p in &self.grid.threshold {
            let q = h.apply(*p);
            if let Some(v) = mean_3x3(img, q.x, q.y) {
                self.scratch_thr.push(v);
            }
        }

        read_bits(
            &self.scratch_bits,
            &self.scratch_thr,
            self.grid.cells,
            self.matcher.dictionary().marker_size,
            self.params.border_bits,
            self.params.min_border_score,
        )
    }
}

/// Binarize cell means and pack the inner bits, trying both polarities.
fn read_bits(
    samples: &[u8],
    thr_samples: &[u8],
    cells: usize,
    bits: usize,
    border: usize,
    min_border_score: f32,
) -> Option<Observation> {
    if samples.len() != cells * cells {
        return None;
    }
    let thr = otsu_threshold(if thr_samples.is_empty() {
        samples
    } else {
        thr_samples
    });

    let mut best: Option<Observation> = None;
    for inverted in [false, true] {
        let (mut border_black, mut border_total) = (0u32, 0u32);
        let mut code = 0u64;

        for cy in 0..cells {
            for cx in 0..cells {
                let is_black = (samples[cy * cells + cx] < thr) != inverted;
                let on_border = border > 0
                    && (cx < border || cy < border || cx + border >= cells || cy + border >= cells);
                if on_border {
                    border_total += 1;
                    border_black += is_black as u32;
                } else if is_black {
                    code |= 1u64 << ((cy - border) * bits + (cx - border));
                }
            }
        }

        let border_score = if border_total > 0 {
            border_black as f32 / border_total as f32
        } else {
            1.0
        };
        if border_score < min_border_score {
            continue;
        }
        if best.map(|b| border_score > b.border_score).unwrap_or(true) {
            best = Some(Observation {
                code,
                border_score,
                inverted,
            });
        }
    }
    best
}

fn mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    let (ix, iy) = (x.floor() as i64, y.floor() as i64);
    if ix < 1 || iy < 1 || ix + 1 >= img.width as i64 || iy + 1 >= img.height as i64 {
        return None;
    }
    let (ix, iy) = (ix as usize, iy as usize);
    let mut sum = 0u32;
    for yy in iy - 1..=iy + 1 {
        for xx in ix - 1..=ix + 1 {
            sum += img.data[yy * img.width + xx] as u32;
        }
    }
    Some((sum / 9) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_marker, test_dictionary};
    use bulk_picker_core::GrayImage;

    #[test]
    fn decodes_axis_aligned_marker() {
        let dict = test_dictionary();
        let mut img = GrayImage::filled(120, 120, 255);
        draw_marker(&mut img, &dict, 1, 20, 20, 10);

        let matcher = Matcher::new(dict, 0);
        let params = DecodeParams::default();
        let mut decoder = QuadDecoder::new(&params, &matcher).expect("decoder");
        let corners = [
            Point2::new(19.5, 19.5),
            Point2::new(99.5, 19.5),
            Point2::new(99.5, 99.5),
            Point2::new(19.5, 99.5),
        ];
        let det = decoder.decode(&img.view(), &corners).expect("marker");
        assert_eq!((det.id, det.rotation, det.hamming), (1, 0, 0));
        assert!(!det.inverted);
        assert!((det.score - 1.0).abs() < 1e-6);
        assert_eq!(det.center, Point2::new(59.5, 59.5));
    }

    #[test]
    fn corner_order_shift_reports_rotation() {
        let dict = test_dictionary();
        let mut img = GrayImage::filled(120, 120, 255);
        draw_marker(&mut img, &dict, 2, 20, 20, 10);

        let matcher = Matcher::new(dict, 0);
        let params = DecodeParams::default();
        let mut decoder = QuadDecoder::new(&params, &matcher).expect("decoder");
        let corners = [
            Point2::new(99.5, 19.5),
            Point2::new(99.5, 99.5),
            Point2::new(19.5, 99.5),
            Point2::new(19.5, 19.5),
        ];
        let det = decoder.decode(&img.view(), &corners).expect("marker");
        assert_eq!(det.id, 2);
        assert_ne!(det.rotation, 0);
    }

    #[test]
    fn blank_quad_does_not_decode() {
        let dict = test_dictionary();
        let img = GrayImage::filled(120, 120, 255);
        let matcher = Matcher::new(dict, 0);
        let params = DecodeParams::default();
        let mut decoder = QuadDecoder::new(&params, &matcher).expect("decoder");
        let corners = [
            Point2::new(19.5, 19.5),
            Point2::new(99.5, 19.5),
            Point2::new(99.5, 99.5),
            Point2::new(19.5, 99.5),
        ];
        assert!(decoder.decode(&img.view(), &corners).is_none());
    }
}
