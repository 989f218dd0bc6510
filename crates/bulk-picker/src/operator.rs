//! Human-in-the-loop steps of the calibration workflow.

use nalgebra::Point2;
use std::io::{self, BufRead, Write};

#[derive(thiserror::Error, Debug)]
pub enum OperatorError {
    #[error("calibration aborted by operator")]
    Aborted,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The person placing markers and jogging the arm.
pub trait Operator {
    /// Return once the markers lie in the bulk area.
    fn await_markers_placed(&mut self) -> Result<(), OperatorError>;

    /// Report the marker ids found in the calibration frame.
    fn markers_detected(&mut self, ids: &[u32]) {
        let _ = ids;
    }

    /// Return once the arm has been jogged directly above marker `id`.
    fn await_arm_over_marker(&mut self, id: u32, image_point: Point2<f32>)
        -> Result<(), OperatorError>;
}

/// Prompts on a writer and waits for Enter on a reader; `q` aborts.
pub struct PromptOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, text: &str) -> Result<(), OperatorError> {
        write!(self.output, "{text} >> ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 || line.trim().eq_ignore_ascii_case("q") {
            return Err(OperatorError::Aborted);
        }
        Ok(())
    }
}

/// Operator on the process terminal.
pub type StdinOperator = PromptOperator<io::StdinLock<'static>, io::Stdout>;

impl StdinOperator {
    pub fn stdio() -> Self {
        PromptOperator::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Operator for PromptOperator<R, W> {
    fn await_markers_placed(&mut self) -> Result<(), OperatorError> {
        self.prompt("Place the calibration markers and press Enter.")
    }

    fn markers_detected(&mut self, ids: &[u32]) {
        let _ = writeln!(self.output, "Detected marker ids: {ids:?}");
    }

    fn await_arm_over_marker(
        &mut self,
        id: u32,
        _image_point: Point2<f32>,
    ) -> Result<(), OperatorError> {
        self.prompt(&format!("Move the arm above marker No.{id} and press Enter."))
    }
}
