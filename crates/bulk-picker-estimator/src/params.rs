use bulk_picker_core::CannyParams;
use serde::{Deserialize, Serialize};

/// Inclusive hue range in the 8-bit convention (`0..180`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueBand {
    pub lower: u8,
    pub upper: u8,
}

impl Default for HueBand {
    fn default() -> Self {
        Self {
            lower: 30,
            upper: 120,
        }
    }
}

/// Candidate extraction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorParams {
    /// Hue band of the bulk items.
    pub hue: HueBand,
    pub canny: CannyParams,
    /// Erosions applied to the inverted edge map.
    pub edge_erode_iterations: usize,
    /// Closings applied after the erosion.
    pub close_iterations: usize,
    /// Openings applied to the hue-masked result.
    pub open_iterations: usize,
    /// Sure-foreground threshold as a fraction of the maximum distance.
    pub foreground_ratio: f32,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            hue: HueBand::default(),
            canny: CannyParams::default(),
            edge_erode_iterations: 1,
            close_iterations: 2,
            open_iterations: 2,
            foreground_ratio: 0.2,
        }
    }
}

/// Grasp-window search around a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustParams {
    /// Side of the suction footprint in pixels.
    pub picker_size: usize,
    /// The search square is `picker_size * search_rate` wide.
    pub search_rate: usize,
    /// Window stride in pixels.
    pub step: usize,
    /// A window with at most this many obstacle pixels is graspable.
    pub max_obstacle_pixels: usize,
}

impl Default for AdjustParams {
    fn default() -> Self {
        Self {
            picker_size: 20,
            search_rate: 3,
            step: 3,
            max_obstacle_pixels: 10,
        }
    }
}

impl AdjustParams {
    /// Same search with another suction footprint.
    pub fn with_picker_size(self, picker_size: usize) -> Self {
        Self {
            picker_size,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let p: EstimatorParams =
            serde_json::from_str(r#"{"hue":{"lower":40,"upper":90}}"#).expect("parse");
        assert_eq!(p.hue, HueBand { lower: 40, upper: 90 });
        assert_eq!(p.close_iterations, 2);
        assert_eq!(p.canny, CannyParams::default());

        let a: AdjustParams = serde_json::from_str(r#"{"picker_size":30}"#).expect("parse");
        assert_eq!(a, AdjustParams::default().with_picker_size(30));
    }
}
