use serde::{Deserialize, Serialize};

/// Arm-frame pose: Cartesian position in millimetres plus end-effector rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r_head: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64, r_head: f64) -> Self {
        Self { x, y, z, r_head }
    }

    /// Same pose at another height.
    #[inline]
    pub fn with_z(self, z: f64) -> Self {
        Self { z, ..self }
    }

    /// Same height and rotation at another planar location.
    #[inline]
    pub fn with_xy(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }

    /// Component-wise offset.
    #[inline]
    pub fn shifted(self, dx: f64, dy: f64, dz: f64, dr: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
            r_head: self.r_head + dr,
        }
    }
}
