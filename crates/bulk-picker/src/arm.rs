//! Arm driver boundary.

use bulk_picker_core::Position;
use serde::{Deserialize, Serialize};

/// Point-to-point interpolation requested from the arm controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// Joint-interpolated move to a Cartesian target.
    #[default]
    JointXyz,
    /// Straight-line Cartesian move.
    LinearXyz,
    /// Joint-interpolated move where `x, y, z, r_head` carry joint angles.
    JointAngles,
}

#[derive(thiserror::Error, Debug)]
pub enum ArmError {
    #[error("failed to connect to arm: {0}")]
    ConnectionFailure(String),
    #[error("arm is not connected")]
    NotConnected,
    #[error("arm command failed: {0}")]
    Command(String),
}

/// Command interface of the picking arm.
///
/// `wait = false` queues the motion and returns immediately; the controller
/// executes queued commands in order.
pub trait ArmDriver {
    fn connect(&mut self) -> Result<(), ArmError>;
    fn disconnect(&mut self) -> Result<(), ArmError>;
    fn move_to(&mut self, pose: Position, mode: MotionMode, wait: bool) -> Result<(), ArmError>;
    fn current_pose(&mut self) -> Result<Position, ArmError>;
    fn set_suction(&mut self, on: bool) -> Result<(), ArmError>;
    fn set_gripper(&mut self, closed: bool) -> Result<(), ArmError>;
    fn set_home(&mut self, home: Position) -> Result<(), ArmError>;

    /// Move relative to the current pose.
    fn shift(
        &mut self,
        dx: f64,
        dy: f64,
        dz: f64,
        dr: f64,
        wait: bool,
    ) -> Result<Position, ArmError> {
        let target = self.current_pose()?.shifted(dx, dy, dz, dr);
        self.move_to(target, MotionMode::JointXyz, wait)?;
        Ok(target)
    }
}
