use crate::{read_distances, SensorError};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serialport::{SerialPortInfo, SerialPortType};
use std::io::BufReader;
use std::time::Duration;

/// Source of raw distance readings in millimetres.
pub trait DepthSampler {
    /// Block until exactly `times` valid readings are collected.
    fn acquire_distance(&mut self, times: usize) -> Result<Vec<u32>, SensorError>;
}

/// How to find and talk to the sensor microcontroller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// USB product id of the board (67 is the Arduino Uno).
    pub usb_pid: u16,
    /// Optional USB vendor id filter.
    pub usb_vid: Option<u16>,
    /// Fixed port path; skips discovery when set.
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Per-read timeout; timeouts are retried.
    pub timeout_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            usb_pid: 67,
            usb_vid: None,
            port: None,
            baud_rate: 9600,
            timeout_ms: 1000,
        }
    }
}

impl SensorConfig {
    fn matches(&self, port: &SerialPortInfo) -> bool {
        match &port.port_type {
            SerialPortType::UsbPort(usb) => {
                usb.pid == self.usb_pid && self.usb_vid.map_or(true, |vid| usb.vid == vid)
            }
            _ => false,
        }
    }
}

/// Pick the first port matching the configured USB ids.
pub fn select_port(config: &SensorConfig, ports: &[SerialPortInfo]) -> Result<String, SensorError> {
    ports
        .iter()
        .find(|p| config.matches(p))
        .map(|p| p.port_name.clone())
        .ok_or(SensorError::SensorNotFound {
            pid: config.usb_pid,
            vid: config.usb_vid,
        })
}

/// Resolve the sensor's port path from the config or by USB discovery.
pub fn find_sensor_port(config: &SensorConfig) -> Result<String, SensorError> {
    if let Some(port) = &config.port {
        return Ok(port.clone());
    }
    let ports = serialport::available_ports()?;
    debug!("{} serial ports visible", ports.len());
    select_port(config, &ports)
}

/// Distance sensor behind a USB serial microcontroller.
///
/// The port is opened for each burst and closed when the burst ends.
#[derive(Clone, Debug, Default)]
pub struct SerialDepthSampler {
    pub config: SensorConfig,
}

impl SerialDepthSampler {
    pub fn new(config: SensorConfig) -> Self {
        Self { config }
    }
}

impl DepthSampler for SerialDepthSampler {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self))
    )]
    fn acquire_distance(&mut self, times: usize) -> Result<Vec<u32>, SensorError> {
        let path = find_sensor_port(&self.config)?;
        let port = serialport::new(&path, self.config.baud_rate)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .open()?;
        info!("reading {times} distances from {path}");
        let mut reader = BufReader::new(port);
        read_distances(&mut reader, times)
    }
}
