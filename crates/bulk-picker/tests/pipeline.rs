//! End-to-end pick and calibration runs against in-memory hardware.

use std::collections::VecDeque;
use std::path::Path;

use approx::assert_abs_diff_eq;
use bulk_picker::aruco::Dictionary;
use bulk_picker::core::{ColorImage, Position};
use bulk_picker::sensor::{DepthSampler, SensorError};
use bulk_picker::transform::{CalibrationSample, CoordinateTransformer};
use bulk_picker::{
    ArmDriver, ArmError, Camera, CameraError, CameraSettings, MotionConfig, MotionMode, Operator,
    OperatorError, Picker, PickerConfig, PickingError,
};
use nalgebra::Point2;

#[derive(Debug, Clone, PartialEq)]
enum ArmCall {
    Connect,
    Home(Position),
    Move(Position, bool),
    Suction(bool),
}

#[derive(Default)]
struct RecordingArm {
    calls: Vec<ArmCall>,
    poses: VecDeque<Position>,
}

impl RecordingArm {
    fn moves(&self) -> Vec<(Position, bool)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ArmCall::Move(p, wait) => Some((*p, *wait)),
                _ => None,
            })
            .collect()
    }
}

impl ArmDriver for RecordingArm {
    fn connect(&mut self) -> Result<(), ArmError> {
        self.calls.push(ArmCall::Connect);
        Ok(())
    }
    fn disconnect(&mut self) -> Result<(), ArmError> {
        Ok(())
    }
    fn move_to(&mut self, pose: Position, mode: MotionMode, wait: bool) -> Result<(), ArmError> {
        assert_eq!(mode, MotionMode::JointXyz);
        self.calls.push(ArmCall::Move(pose, wait));
        Ok(())
    }
    fn current_pose(&mut self) -> Result<Position, ArmError> {
        self.poses.pop_front().ok_or(ArmError::NotConnected)
    }
    fn set_suction(&mut self, on: bool) -> Result<(), ArmError> {
        self.calls.push(ArmCall::Suction(on));
        Ok(())
    }
    fn set_gripper(&mut self, _: bool) -> Result<(), ArmError> {
        Ok(())
    }
    fn set_home(&mut self, home: Position) -> Result<(), ArmError> {
        self.calls.push(ArmCall::Home(home));
        Ok(())
    }
}

struct FrameCamera {
    frame: ColorImage,
    configured: usize,
}

impl FrameCamera {
    fn new(frame: ColorImage) -> Self {
        Self {
            frame,
            configured: 0,
        }
    }
}

impl Camera for FrameCamera {
    fn configure(&mut self, _: &CameraSettings) -> Result<(), CameraError> {
        self.configured += 1;
        Ok(())
    }
    fn capture_frame(&mut self) -> Result<ColorImage, CameraError> {
        Ok(self.frame.clone())
    }
}

struct FixedSampler {
    readings: Vec<u32>,
    requested: Vec<usize>,
}

impl FixedSampler {
    fn new(readings: &[u32]) -> Self {
        Self {
            readings: readings.to_vec(),
            requested: Vec::new(),
        }
    }
}

impl DepthSampler for FixedSampler {
    fn acquire_distance(&mut self, times: usize) -> Result<Vec<u32>, SensorError> {
        self.requested.push(times);
        Ok(self.readings.clone())
    }
}

#[derive(Default)]
struct ScriptedOperator {
    placed: usize,
    detected: Vec<u32>,
    visited: Vec<u32>,
}

impl Operator for ScriptedOperator {
    fn await_markers_placed(&mut self) -> Result<(), OperatorError> {
        self.placed += 1;
        Ok(())
    }
    fn markers_detected(&mut self, ids: &[u32]) {
        self.detected = ids.to_vec();
    }
    fn await_arm_over_marker(&mut self, id: u32, _: Point2<f32>) -> Result<(), OperatorError> {
        self.visited.push(id);
        Ok(())
    }
}

const READINGS: [u32; 6] = [100, 101, 99, 150, 102, 98];

fn station_config(dir: &Path) -> PickerConfig {
    PickerConfig {
        mirror_frames: false,
        motion: MotionConfig::default().without_pauses(),
        model_path: dir.join("model.json"),
        ..PickerConfig::default()
    }
}

fn green_square_frame() -> ColorImage {
    let mut img = ColorImage::filled(640, 480, [0, 0, 0]);
    img.fill_rect(270, 190, 160, 160, [0, 255, 0]);
    img
}

fn checkerboard_frame() -> ColorImage {
    let mut img = ColorImage::filled(640, 480, [0, 0, 0]);
    for y in 0..480 {
        for x in 0..640 {
            if (x / 4 + y / 4) % 2 == 0 {
                img.put_pixel(x, y, [0, 255, 0]);
            }
        }
    }
    img
}

/// Pixel (320, 240) lands at arm (250, 0); half a millimetre per pixel.
fn calibrated_transformer(path: &Path) -> CoordinateTransformer {
    let to_robot = |u: f64, v: f64| Point2::new(0.5 * (u - 320.0) + 250.0, 0.5 * (v - 240.0));
    let samples: Vec<_> = [(100.0, 100.0), (540.0, 120.0), (300.0, 420.0), (600.0, 400.0)]
        .into_iter()
        .map(|(u, v)| CalibrationSample::new(Point2::new(u, v), to_robot(u, v)))
        .collect();
    let mut t = CoordinateTransformer::open(path).expect("open");
    t.fit(&samples).expect("fit");
    t
}

fn calibrated_picker(
    dir: &Path,
    frame: ColorImage,
) -> Picker<RecordingArm, FrameCamera, FixedSampler> {
    let config = station_config(dir);
    let transformer = calibrated_transformer(&config.model_path);
    Picker::with_transformer(
        RecordingArm::default(),
        FrameCamera::new(frame),
        FixedSampler::new(&READINGS),
        transformer,
        config,
    )
}

#[test]
fn pick_from_bulk_grasps_the_item_centre() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut picker = calibrated_picker(dir.path(), green_square_frame());

    let outcome = picker.pick_from_bulk(0.0).expect("pick");
    assert_eq!(outcome.candidate_rank, 0);
    assert_abs_diff_eq!(outcome.grasp.x, 250.0, epsilon = 2.0);
    assert_abs_diff_eq!(outcome.grasp.y, 0.0, epsilon = 2.0);
    assert_abs_diff_eq!(outcome.sensor_distance, 100.0);
    assert_abs_diff_eq!(outcome.depth, 60.0);
    assert_abs_diff_eq!(outcome.above_target.z, -25.0);
    assert_abs_diff_eq!(outcome.grasp.z, -85.0);
    assert_abs_diff_eq!(outcome.retreat.z, 85.0);
    assert_abs_diff_eq!(outcome.measuring.x, outcome.above_target.x - 50.0, epsilon = 0.1);

    let (arm, camera, sensor, _) = picker.into_parts();
    assert_eq!(camera.configured, 1);
    assert_eq!(sensor.requested, vec![60]);
    assert_eq!(
        arm.calls,
        vec![
            ArmCall::Move(outcome.measuring, true),
            ArmCall::Move(outcome.above_target, false),
            ArmCall::Move(outcome.grasp, false),
            ArmCall::Suction(true),
            ArmCall::Move(outcome.retreat, true),
        ]
    );
}

#[test]
fn distance_error_shifts_the_grasp_depth() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut picker = calibrated_picker(dir.path(), green_square_frame());
    let outcome = picker.pick_from_bulk(5.0).expect("pick");
    assert_abs_diff_eq!(outcome.depth, 65.0);
    assert_abs_diff_eq!(outcome.grasp.z, -90.0);
}

#[test]
fn cluttered_frame_fails_without_moving() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut picker = calibrated_picker(dir.path(), checkerboard_frame());
    let err = picker.pick_from_bulk(0.0).unwrap_err();
    assert!(matches!(err, PickingError::NoPickableItem), "{err}");
    assert!(picker.arm().calls.is_empty());
}

#[test]
fn uncalibrated_station_refuses_to_pick() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut picker = Picker::new(
        RecordingArm::default(),
        FrameCamera::new(green_square_frame()),
        FixedSampler::new(&READINGS),
        station_config(dir.path()),
    )
    .expect("picker");
    assert!(!picker.transformer().is_calibrated());
    let err = picker.pick_from_bulk(0.0).unwrap_err();
    assert!(err.is_not_calibrated(), "{err}");
    assert!(picker.arm().moves().is_empty());
}

#[test]
fn invalid_readings_stop_before_descending() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = station_config(dir.path());
    let transformer = calibrated_transformer(&config.model_path);
    let mut picker = Picker::with_transformer(
        RecordingArm::default(),
        FrameCamera::new(green_square_frame()),
        FixedSampler::new(&[200, 300, 131]),
        transformer,
        config,
    );
    let err = picker.pick_from_bulk(0.0).unwrap_err();
    assert!(matches!(err, PickingError::Sensor(SensorError::NoValidReadings { .. })), "{err}");
    assert_eq!(picker.arm().moves().len(), 1);
}

#[test]
fn activate_sends_the_home_pose() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut picker = calibrated_picker(dir.path(), green_square_frame());
    picker.activate().expect("activate");
    assert_eq!(
        picker.arm().calls,
        vec![
            ArmCall::Connect,
            ArmCall::Home(Position::new(250.0, 0.0, 100.0, 0.0))
        ]
    );
}

#[test]
fn carry_picks_passes_waypoints_and_releases() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut picker = calibrated_picker(dir.path(), green_square_frame());
    let src = Position::new(200.0, 50.0, -30.0, 0.0);
    let via = Position::new(200.0, 0.0, 80.0, 0.0);
    let dst = Position::new(150.0, -120.0, 0.0, 0.0);
    picker.carry(src, &[via], dst).expect("carry");
    assert_eq!(
        picker.arm().calls,
        vec![
            ArmCall::Move(src, true),
            ArmCall::Suction(true),
            ArmCall::Move(via, true),
            ArmCall::Move(dst, true),
            ArmCall::Suction(false),
        ]
    );
}

const TEST_CODES: [u64; 3] = [0x9_9952_BC8D, 0x5_6A3B_1B13, 0xC_8D8D_C276];

fn test_dictionary() -> Dictionary {
    Dictionary {
        name: "TEST_6X6_3".into(),
        marker_size: 6,
        max_correction_bits: 2,
        codes: TEST_CODES.to_vec(),
    }
}

fn draw_marker(img: &mut ColorImage, code: u64, x0: usize, y0: usize, cell_px: usize) {
    let n = 6;
    let cells = n + 2;
    for cy in 0..cells {
        for cx in 0..cells {
            let border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
            let black = border || (code >> ((cy - 1) * n + (cx - 1))) & 1 == 1;
            let v = if black { 0 } else { 255 };
            img.fill_rect(x0 + cx * cell_px, y0 + cy * cell_px, cell_px, cell_px, [v, v, v]);
        }
    }
}

/// Markers 2, 1 and 0 at (20, 30), (20, 140) and (200, 120), 10 px cells.
fn marker_frame() -> ColorImage {
    let mut img = ColorImage::filled(320, 240, [235, 235, 235]);
    draw_marker(&mut img, TEST_CODES[2], 20, 30, 10);
    draw_marker(&mut img, TEST_CODES[1], 20, 140, 10);
    draw_marker(&mut img, TEST_CODES[0], 200, 120, 10);
    img
}

#[test]
fn calibration_pairs_markers_with_jogged_poses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dict_path = dir.path().join("dict.json");
    test_dictionary().write_json(&dict_path).expect("write dict");
    let mut config = station_config(dir.path());
    config.dictionary_path = Some(dict_path);
    let model_path = config.model_path.clone();

    let to_robot = |u: f64, v: f64| Position::new(0.5 * u + 100.0, -0.5 * v + 50.0, 10.0, 0.0);
    let arm = RecordingArm {
        poses: [(239.5, 159.5), (59.5, 179.5), (59.5, 69.5)]
            .into_iter()
            .map(|(u, v)| to_robot(u, v))
            .collect(),
        ..RecordingArm::default()
    };
    let mut picker = Picker::new(
        arm,
        FrameCamera::new(marker_frame()),
        FixedSampler::new(&READINGS),
        config,
    )
    .expect("picker");

    let mut operator = ScriptedOperator::default();
    let samples = picker
        .calibrate_coordinate_transformer(&mut operator)
        .expect("calibrate");
    assert_eq!(operator.placed, 1);
    assert_eq!(operator.detected, vec![0, 1, 2]);
    assert_eq!(operator.visited, vec![0, 1, 2]);
    assert_eq!(samples.len(), 3);
    assert!(picker.transformer().is_calibrated());
    assert!(model_path.exists());

    let p = picker
        .transformer()
        .predict(Point2::new(160.0, 120.0))
        .expect("predict");
    assert_abs_diff_eq!(p.x, 180.0, epsilon = 1.0);
    assert_abs_diff_eq!(p.y, -10.0, epsilon = 1.0);

    let reloaded = CoordinateTransformer::open(&model_path).expect("reopen");
    assert!(reloaded.is_calibrated());
}

#[test]
fn calibration_without_markers_keeps_the_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blank = ColorImage::filled(320, 240, [235, 235, 235]);
    let mut picker = calibrated_picker(dir.path(), blank).with_dictionary(test_dictionary());
    let before = *picker.transformer().model().expect("model");
    let mut operator = ScriptedOperator::default();
    let err = picker
        .calibrate_coordinate_transformer(&mut operator)
        .unwrap_err();
    assert!(matches!(err, PickingError::NoMarkers), "{err}");
    assert!(operator.detected.is_empty());
    assert_eq!(picker.transformer().model(), Some(&before));
}

#[test]
fn calibration_needs_a_dictionary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut picker = calibrated_picker(dir.path(), marker_frame());
    let mut operator = ScriptedOperator::default();
    let err = picker
        .calibrate_coordinate_transformer(&mut operator)
        .unwrap_err();
    assert!(matches!(err, PickingError::NoDictionary), "{err}");
    assert_eq!(operator.placed, 0);
}
