//! JSON configuration for a picker station.

use crate::{CameraSettings, SensorDisplacement};
use bulk_picker_aruco::MarkerDetectorParams;
use bulk_picker_core::Position;
use bulk_picker_estimator::{AdjustParams, EstimatorParams};
use bulk_picker_sensor::SensorConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Heights, settle times and sampling of the pick sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Z of the approach pose above the bulk, in millimetres.
    pub approach_z: f64,
    /// Z the arm retreats to after grasping.
    pub retreat_z: f64,
    /// End-effector rotation used for every pick pose.
    pub r_head: f64,
    /// Pause before sampling the distance sensor.
    pub measure_settle_ms: u64,
    /// Pause after engaging suction at the grasp pose.
    pub grasp_settle_ms: u64,
    /// Pause after engaging suction in a plain pick at a known pose.
    pub pick_settle_ms: u64,
    /// Pause after releasing suction.
    pub release_settle_ms: u64,
    /// Readings per depth measurement.
    pub distance_samples: usize,
    /// Readings at or above this many millimetres are discarded.
    pub max_valid_distance: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            approach_z: -25.0,
            retreat_z: 85.0,
            r_head: 0.0,
            measure_settle_ms: 500,
            grasp_settle_ms: 800,
            pick_settle_ms: 400,
            release_settle_ms: 200,
            distance_samples: 60,
            max_valid_distance: 130,
        }
    }
}

impl MotionConfig {
    /// Same sequence with every pause removed.
    pub fn without_pauses(self) -> Self {
        Self {
            measure_settle_ms: 0,
            grasp_settle_ms: 0,
            pick_settle_ms: 0,
            release_settle_ms: 0,
            ..self
        }
    }
}

pub(crate) fn settle(ms: u64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

fn default_home() -> Position {
    Position::new(250.0, 0.0, 100.0, 0.0)
}

fn default_model_path() -> PathBuf {
    PathBuf::from("coordinate_model.json")
}

fn default_adjust() -> AdjustParams {
    AdjustParams::default().with_picker_size(30)
}

/// Everything a picker station needs besides its hardware handles.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Home pose sent to the arm on activation.
    pub home: Position,
    pub camera: CameraSettings,
    /// Mirror frames left/right after capture.
    pub mirror_frames: bool,
    pub estimator: EstimatorParams,
    pub adjust: AdjustParams,
    pub sensor: SensorConfig,
    pub displacement: SensorDisplacement,
    pub motion: MotionConfig,
    /// Coordinate model file, created by calibration.
    pub model_path: PathBuf,
    /// Marker dictionary JSON used by calibration.
    pub dictionary_path: Option<PathBuf>,
    pub markers: MarkerDetectorParams,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            camera: CameraSettings::default(),
            mirror_frames: true,
            estimator: EstimatorParams::default(),
            adjust: default_adjust(),
            sensor: SensorConfig::default(),
            displacement: SensorDisplacement::default(),
            motion: MotionConfig::default(),
            model_path: default_model_path(),
            dictionary_path: None,
            markers: MarkerDetectorParams::default(),
        }
    }
}

impl PickerConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_station() {
        let cfg = PickerConfig::default();
        assert_eq!(cfg.adjust.picker_size, 30);
        assert_eq!(cfg.motion.approach_z, -25.0);
        assert_eq!(cfg.motion.distance_samples, 60);
        assert_eq!(cfg.displacement.dx, 50.0);
        assert_eq!(cfg.camera.exposure, 500);
        assert!(cfg.mirror_frames);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("picker.json");
        fs::write(
            &path,
            r#"{ "mirror_frames": false, "motion": { "retreat_z": 60.0 }, "model_path": "m.json" }"#,
        )
        .expect("write");
        let cfg = PickerConfig::load_json(&path).expect("load");
        assert!(!cfg.mirror_frames);
        assert_eq!(cfg.motion.retreat_z, 60.0);
        assert_eq!(cfg.motion.approach_z, -25.0);
        assert_eq!(cfg.model_path, PathBuf::from("m.json"));
        assert_eq!(cfg.adjust.picker_size, 30);
    }

    #[test]
    fn written_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("picker.json");
        let mut cfg = PickerConfig::default();
        cfg.dictionary_path = Some("dict.json".into());
        cfg.motion = cfg.motion.without_pauses();
        cfg.write_json(&path).expect("write");
        assert_eq!(PickerConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("picker.json");
        fs::write(&path, "{ not json").expect("write");
        assert!(matches!(
            PickerConfig::load_json(&path),
            Err(ConfigError::Json(_))
        ));
    }
}
