//! Distance sensor sampling.
//!
//! The sensor is a time-of-flight module behind a USB microcontroller that
//! prints one reading per line. Lines are parsed leniently (first run of
//! digits), bursts are reduced with a filtered median.

mod error;
mod reading;
mod serial;

pub use error::SensorError;
pub use reading::{parse_distance_line, read_distances, reduce_distance};
pub use serial::{find_sensor_port, select_port, DepthSampler, SensorConfig, SerialDepthSampler};
