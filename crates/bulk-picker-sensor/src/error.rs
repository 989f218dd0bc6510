#[derive(thiserror::Error, Debug)]
pub enum SensorError {
    #[error("distance sensor not found (usb pid {pid}, vid {vid:?})")]
    SensorNotFound { pid: u16, vid: Option<u16> },
    #[error("sensor stream closed after {got} of {wanted} readings")]
    StreamClosed { got: usize, wanted: usize },
    #[error("no reading below {max_valid} mm among {total} samples")]
    NoValidReadings { total: usize, max_valid: u32 },
    #[error(transparent)]
    Serial(#[from] serialport::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
