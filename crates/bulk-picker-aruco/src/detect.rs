//! Full-frame marker detection.

use crate::contour::{approx_polygon_closed, closed_perimeter, is_convex, signed_area, trace_outer_boundary};
use crate::decode::{DecodeParams, MarkerDetection, QuadDecoder};
use crate::threshold::adaptive_threshold_inv;
use crate::{Dictionary, Matcher};
use bulk_picker_core::{label_components, ComponentStats, GrayImageView};
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate search and decoding parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerDetectorParams {
    /// Half-size of the local-mean threshold window.
    pub threshold_radius: usize,
    /// Subtracted from the local mean before comparing.
    pub threshold_offset: i32,
    /// Minimum traced boundary length in pixels.
    pub min_perimeter: f32,
    /// Polygon simplification tolerance relative to the boundary length.
    pub approx_epsilon_rel: f32,
    /// Minimum quad side in pixels.
    pub min_side: f32,
    /// Accepted bit errors, capped by the dictionary.
    pub max_hamming: u8,
    pub decode: DecodeParams,
}

impl Default for MarkerDetectorParams {
    fn default() -> Self {
        Self {
            threshold_radius: 10,
            threshold_offset: 7,
            min_perimeter: 80.0,
            approx_epsilon_rel: 0.04,
            min_side: 20.0,
            max_hamming: 3,
            decode: DecodeParams::default(),
        }
    }
}

/// Marker detector bound to one dictionary.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    pub params: MarkerDetectorParams,
    matcher: Matcher,
}

impl MarkerDetector {
    pub fn new(dictionary: Dictionary, params: MarkerDetectorParams) -> Self {
        let matcher = Matcher::new(dictionary, params.max_hamming);
        Self { params, matcher }
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        self.matcher.dictionary()
    }

    /// Candidate quadrilaterals, corners clockwise from the one nearest the top-left.
    pub fn find_quads(&self, img: &GrayImageView<'_>) -> Vec<[Point2<f32>; 4]> {
        let p = &self.params;
        let binary = adaptive_threshold_inv(img, p.threshold_radius, p.threshold_offset);
        let labels = label_components(&binary);

        let mut quads = Vec::new();
        for comp in &labels.stats {
            if touches_border(comp, img.width, img.height) {
                continue;
            }
            if 2 * (comp.width + comp.height) < p.min_perimeter as usize {
                continue;
            }
            let contour: Vec<Point2<f32>> = trace_outer_boundary(&labels, comp)
                .into_iter()
                .map(|q| Point2::new(q.x as f32, q.y as f32))
                .collect();
            let perimeter = closed_perimeter(&contour);
            if perimeter < p.min_perimeter {
                continue;
            }
            let poly = approx_polygon_closed(&contour, p.approx_epsilon_rel * perimeter);
            if poly.len() != 4 || !is_convex(&poly) {
                continue;
            }
            let Some(quad) = orient_quad(&poly) else {
                continue;
            };
            let min_side = (0..4)
                .map(|i| (quad[(i + 1) % 4] - quad[i]).norm())
                .fold(f32::INFINITY, f32::min);
            if min_side < p.min_side {
                continue;
            }
            quads.push(expand_to_pixel_edges(quad));
        }
        quads
    }

    /// Every decodable marker, in candidate order.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, img), fields(w = img.width, h = img.height))
    )]
    pub fn detect(&self, img: &GrayImageView<'_>) -> Vec<MarkerDetection> {
        let quads = self.find_quads(img);
        let Some(mut decoder) = QuadDecoder::new(&self.params.decode, &self.matcher) else {
            return Vec::new();
        };
        let out: Vec<MarkerDetection> = quads
            .iter()
            .filter_map(|q| decoder.decode(img, q))
            .collect();
        debug!(
            "{} quad candidates, {} markers decoded ({})",
            quads.len(),
            out.len(),
            self.dictionary().name
        );
        out
    }

    /// Marker centres keyed by id; a later detection of the same id replaces an earlier one.
    pub fn detect_markers(&self, img: &GrayImageView<'_>) -> BTreeMap<u32, Point2<f32>> {
        self.detect(img)
            .into_iter()
            .map(|d| (d.id, d.center))
            .collect()
    }
}

fn touches_border(comp: &ComponentStats, width: usize, height: usize) -> bool {
    comp.left == 0
        || comp.top == 0
        || comp.left + comp.width >= width
        || comp.top + comp.height >= height
}

/// Clockwise order (image coordinates) starting at the corner with the smallest `x + y`.
fn orient_quad(poly: &[Point2<f32>]) -> Option<[Point2<f32>; 4]> {
    let mut quad: [Point2<f32>; 4] = poly.try_into().ok()?;
    if signed_area(&quad) < 0.0 {
        quad.reverse();
    }
    let first = (0..4).min_by(|&a, &b| (quad[a].x + quad[a].y).total_cmp(&(quad[b].x + quad[b].y)))?;
    quad.rotate_left(first);
    Some(quad)
}

/// Boundary pixels are centres; push each corner half a pixel outwards.
fn expand_to_pixel_edges(quad: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    let cx = quad.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = quad.iter().map(|p| p.y).sum::<f32>() / 4.0;
    quad.map(|p| Point2::new(p.x + 0.5 * (p.x - cx).signum(), p.y + 0.5 * (p.y - cy).signum()))
}
