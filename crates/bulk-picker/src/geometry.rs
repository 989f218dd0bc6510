use bulk_picker_core::Position;
use serde::{Deserialize, Serialize};

/// Offset of the distance sensor from the suction tip, in the tool frame.
///
/// `dx` points radially outward from the arm base, `dz` upward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorDisplacement {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Default for SensorDisplacement {
    fn default() -> Self {
        Self {
            dx: 50.0,
            dy: 0.0,
            dz: 40.0,
        }
    }
}

/// Tool pose that puts the distance sensor directly above `above_target`.
///
/// The tool-frame offset is rotated by the arm's heading towards the target.
/// A target on the base axis (`x = y = 0`) uses the +x heading.
pub fn measuring_position(above_target: Position, disp: &SensorDisplacement) -> Position {
    if disp.dx == 0.0 && disp.dy == 0.0 {
        return above_target;
    }
    let (xa, ya) = (above_target.x, above_target.y);
    let r = xa.hypot(ya);
    let (sin, cos) = if r > f64::EPSILON {
        (ya / r, xa / r)
    } else {
        (0.0, 1.0)
    };
    above_target.with_xy(
        xa - cos * disp.dx + sin * disp.dy,
        ya - sin * disp.dx - cos * disp.dy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_planar_offset_is_identity() {
        let above = Position::new(123.0, -45.0, -25.0, 0.0);
        let disp = SensorDisplacement {
            dx: 0.0,
            dy: 0.0,
            dz: 40.0,
        };
        assert_eq!(measuring_position(above, &disp), above);
    }

    #[test]
    fn radial_offset_pulls_towards_the_base() {
        let disp = SensorDisplacement::default();
        let p = measuring_position(Position::new(250.0, 0.0, -25.0, 0.0), &disp);
        assert_relative_eq!(p.x, 200.0);
        assert_relative_eq!(p.y, 0.0);
        assert_eq!((p.z, p.r_head), (-25.0, 0.0));

        let q = measuring_position(Position::new(0.0, 200.0, -25.0, 0.0), &disp);
        assert_relative_eq!(q.x, 0.0);
        assert_relative_eq!(q.y, 150.0);
    }

    #[test]
    fn lateral_offset_is_rotated_with_heading() {
        let disp = SensorDisplacement {
            dx: 0.0,
            dy: 10.0,
            dz: 0.0,
        };
        let p = measuring_position(Position::new(100.0, 0.0, 0.0, 0.0), &disp);
        assert_relative_eq!(p.x, 100.0);
        assert_relative_eq!(p.y, -10.0);

        let d = 100.0 / 2f64.sqrt();
        let q = measuring_position(Position::new(d, d, 0.0, 0.0), &SensorDisplacement::default());
        let expected = d - 50.0 / 2f64.sqrt();
        assert_relative_eq!(q.x, expected, epsilon = 1e-9);
        assert_relative_eq!(q.y, expected, epsilon = 1e-9);
    }

    #[test]
    fn target_on_base_axis_uses_x_heading() {
        let p = measuring_position(Position::new(0.0, 0.0, 10.0, 0.0), &SensorDisplacement::default());
        assert_eq!(p, Position::new(-50.0, 0.0, 10.0, 0.0));
    }
}
