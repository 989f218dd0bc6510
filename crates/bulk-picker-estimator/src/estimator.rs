use crate::{AdjustParams, EstimatorParams};
use bulk_picker_core::{
    apply_mask, canny, close, connected_components, distance_transform, erode, hue_mask, invert,
    open, to_gray, to_hsv, union, ColorImage, GrayImage,
};
use log::{debug, info, trace};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Image location worth trying to grasp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickCandidate {
    /// Pixel coordinates in the frame the candidate was estimated on.
    pub point: Point2<f32>,
    /// Pixel area of the blob the candidate came from.
    pub area: usize,
}

/// Finds flat, reachable spots on hue-masked bulk items.
#[derive(Clone, Debug, Default)]
pub struct PickablePointEstimator {
    pub params: EstimatorParams,
}

impl PickablePointEstimator {
    pub fn new(params: EstimatorParams) -> Self {
        Self { params }
    }

    /// Binary mask of pixels inside the configured hue band.
    pub fn item_mask(&self, image: &ColorImage) -> GrayImage {
        let band = self.params.hue;
        hue_mask(&to_hsv(image), band.lower, band.upper)
    }

    /// Edge-separated item regions, before the distance transform.
    pub fn segment(&self, image: &ColorImage) -> GrayImage {
        let p = &self.params;
        let mask = self.item_mask(image);
        let edges = canny(&to_gray(image), &p.canny);
        let separated = close(
            &erode(&invert(&edges), p.edge_erode_iterations),
            p.close_iterations,
        );
        open(&apply_mask(&separated, &mask), p.open_iterations)
    }

    /// Blob centroids of the sure-foreground cores, largest blob first.
    ///
    /// Blobs of equal area keep their raster order.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(w = image.width, h = image.height))
    )]
    pub fn estimate_pickable_points(&self, image: &ColorImage) -> Vec<PickCandidate> {
        let cleaned = self.segment(image);
        let dist = distance_transform(&cleaned);
        let max = dist.max();
        let sure_fg = dist.threshold(self.params.foreground_ratio * max);

        let mut comps = connected_components(&sure_fg);
        comps.sort_by(|a, b| b.area.cmp(&a.area));
        debug!("{} candidate blobs (max distance {:.1})", comps.len(), max);

        comps
            .iter()
            .map(|c| PickCandidate {
                point: Point2::new(c.centroid.x as f32, c.centroid.y as f32),
                area: c.area,
            })
            .collect()
    }

    /// Search the neighbourhood of `candidate` for a window free of obstacles.
    ///
    /// Obstacles are edge pixels plus pixels outside the hue band. The search
    /// square is shifted inside the image near any edge and only shrinks when
    /// the image is smaller than it. Windows are visited row-major from its
    /// top-left; the centre of the first acceptable window is returned in
    /// frame coordinates.
    pub fn adjust_estimated_point(
        &self,
        image: &ColorImage,
        candidate: &PickCandidate,
        params: &AdjustParams,
    ) -> Option<PickCandidate> {
        let picker = params.picker_size;
        if picker == 0 || image.width == 0 || image.height == 0 {
            return None;
        }
        let side = picker * params.search_rate.max(1);
        let half = (side / 2) as i64;
        let cx = candidate.point.x.round() as i64;
        let cy = candidate.point.y.round() as i64;
        let x0 = (cx - half).clamp(0, image.width.saturating_sub(side) as i64) as usize;
        let y0 = (cy - half).clamp(0, image.height.saturating_sub(side) as i64) as usize;

        let crop = image.crop(x0, y0, side, side);
        if crop.width < picker || crop.height < picker {
            return None;
        }
        let edges = canny(&to_gray(&crop), &self.params.canny);
        let obstacles = union(&edges, &invert(&self.item_mask(&crop)));

        let step = params.step.max(1);
        for wy in (0..=crop.height - picker).step_by(step) {
            for wx in (0..=crop.width - picker).step_by(step) {
                let n = obstacles.count_nonzero_in(wx, wy, picker, picker);
                if n <= params.max_obstacle_pixels {
                    let point = Point2::new(
                        (x0 + wx + picker / 2) as f32,
                        (y0 + wy + picker / 2) as f32,
                    );
                    trace!("window ({wx}, {wy}) accepted with {n} obstacle pixels");
                    return Some(PickCandidate {
                        point,
                        area: candidate.area,
                    });
                }
            }
        }
        None
    }

    /// First of `candidates`, in rank order, that survives adjustment.
    ///
    /// Returns the rank together with the adjusted candidate.
    pub fn select_target(
        &self,
        image: &ColorImage,
        candidates: &[PickCandidate],
        params: &AdjustParams,
    ) -> Option<(usize, PickCandidate)> {
        info!("{} pickable point candidates", candidates.len());
        candidates.iter().enumerate().find_map(|(rank, c)| {
            let adjusted = self.adjust_estimated_point(image, c, params);
            if adjusted.is_none() {
                debug!("candidate #{rank} at {:?} has no clear window", c.point);
            }
            adjusted.map(|a| (rank, a))
        })
    }
}
