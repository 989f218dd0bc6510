//! Pick orchestration.

use crate::config::settle;
use crate::{
    measuring_position, ArmDriver, Camera, MotionMode, Operator, PickerConfig, PickingError,
};
use bulk_picker_aruco::{Dictionary, MarkerDetector};
use bulk_picker_core::{to_gray, ColorImage, Position};
use bulk_picker_estimator::PickablePointEstimator;
use bulk_picker_sensor::{reduce_distance, DepthSampler};
use bulk_picker_transform::{CalibrationSample, CoordinateTransformer};
use log::{debug, info, warn};
use nalgebra::Point2;
use serde::Serialize;

/// What a successful pick did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PickOutcome {
    /// Adjusted grasp point in the (possibly mirrored) frame.
    pub image_point: Point2<f32>,
    /// Rank of the candidate the grasp point came from.
    pub candidate_rank: usize,
    pub above_target: Position,
    pub measuring: Position,
    pub grasp: Position,
    pub retreat: Position,
    /// Filtered median of the sensor burst, in millimetres.
    pub sensor_distance: f64,
    /// Depth below `above_target` that was commanded.
    pub depth: f64,
}

/// A suction arm, a bulk camera and a distance sensor working as one station.
pub struct Picker<A, C, S> {
    arm: A,
    camera: C,
    sensor: S,
    transformer: CoordinateTransformer,
    estimator: PickablePointEstimator,
    detector: Option<MarkerDetector>,
    config: PickerConfig,
}

impl<A: ArmDriver, C: Camera, S: DepthSampler> Picker<A, C, S> {
    /// Assemble a station from its config.
    ///
    /// Opens the coordinate model at `config.model_path` (a missing file
    /// leaves the station uncalibrated) and loads the marker dictionary if
    /// one is configured.
    pub fn new(arm: A, camera: C, sensor: S, config: PickerConfig) -> Result<Self, PickingError> {
        let transformer = CoordinateTransformer::open(&config.model_path)?;
        let mut picker = Self::with_transformer(arm, camera, sensor, transformer, config);
        if let Some(path) = picker.config.dictionary_path.clone() {
            let dict = Dictionary::load_json(&path)?;
            info!("marker dictionary {} ({} ids)", dict.name, dict.codes.len());
            picker = picker.with_dictionary(dict);
        }
        Ok(picker)
    }

    pub fn with_transformer(
        arm: A,
        camera: C,
        sensor: S,
        transformer: CoordinateTransformer,
        config: PickerConfig,
    ) -> Self {
        Self {
            arm,
            camera,
            sensor,
            transformer,
            estimator: PickablePointEstimator::new(config.estimator.clone()),
            detector: None,
            config,
        }
    }

    /// Use `dict` for calibration marker detection.
    pub fn with_dictionary(mut self, dict: Dictionary) -> Self {
        self.detector = Some(MarkerDetector::new(dict, self.config.markers.clone()));
        self
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    pub fn arm(&self) -> &A {
        &self.arm
    }

    pub fn arm_mut(&mut self) -> &mut A {
        &mut self.arm
    }

    pub fn into_parts(self) -> (A, C, S, CoordinateTransformer) {
        (self.arm, self.camera, self.sensor, self.transformer)
    }

    /// Connect the arm and send the configured home pose.
    pub fn activate(&mut self) -> Result<(), PickingError> {
        self.arm.connect()?;
        self.arm.set_home(self.config.home)?;
        info!("arm connected");
        Ok(())
    }

    pub fn deactivate(&mut self) -> Result<(), PickingError> {
        self.arm.disconnect()?;
        Ok(())
    }

    /// One configured frame of the bulk area.
    pub fn capture_bulk(&mut self) -> Result<ColorImage, PickingError> {
        self.camera.configure(&self.config.camera)?;
        let frame = self.camera.capture_frame()?;
        Ok(if self.config.mirror_frames {
            frame.mirrored_horizontally()
        } else {
            frame
        })
    }

    /// Locate an item, measure its height and grasp it.
    ///
    /// `distance_error` is added to the sensor median to compensate a known
    /// sensor bias. Nothing is rolled back when a step fails.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self))
    )]
    pub fn pick_from_bulk(&mut self, distance_error: f64) -> Result<PickOutcome, PickingError> {
        let frame = self.capture_bulk()?;
        let candidates = self.estimator.estimate_pickable_points(&frame);
        let (rank, target) = self
            .estimator
            .select_target(&frame, &candidates, &self.config.adjust)
            .ok_or(PickingError::NoPickableItem)?;

        let m = self.config.motion.clone();
        let xy = self.transformer.predict(Point2::new(
            target.point.x as f64,
            target.point.y as f64,
        ))?;
        let above_target = Position::new(xy.x, xy.y, m.approach_z, m.r_head);
        info!(
            "target #{rank} at image {:?} -> arm ({:.1}, {:.1})",
            target.point, xy.x, xy.y
        );

        let measuring = measuring_position(above_target, &self.config.displacement);
        self.arm.move_to(measuring, MotionMode::JointXyz, true)?;
        settle(m.measure_settle_ms);
        let samples = self.sensor.acquire_distance(m.distance_samples)?;
        let sensor_distance = reduce_distance(&samples, m.max_valid_distance)?;
        let depth = sensor_distance + distance_error - self.config.displacement.dz;
        info!("distance {depth:.1} mm (sensor {sensor_distance:.1} mm)");
        if depth < 0.0 {
            warn!("negative grasp depth {depth:.1} mm; grasp pose is above the approach height");
        }

        let grasp = above_target.with_z(above_target.z - depth);
        self.arm.move_to(above_target, MotionMode::JointXyz, false)?;
        self.arm.move_to(grasp, MotionMode::JointXyz, false)?;
        self.arm.set_suction(true)?;
        settle(m.grasp_settle_ms);
        let retreat = above_target.with_z(m.retreat_z);
        self.arm.move_to(retreat, MotionMode::JointXyz, true)?;

        Ok(PickOutcome {
            image_point: target.point,
            candidate_rank: rank,
            above_target,
            measuring,
            grasp,
            retreat,
            sensor_distance,
            depth,
        })
    }

    /// Move to a known pose and engage suction.
    pub fn pick_at(&mut self, position: Position) -> Result<(), PickingError> {
        self.arm.move_to(position, MotionMode::JointXyz, true)?;
        self.arm.set_suction(true)?;
        settle(self.config.motion.pick_settle_ms);
        Ok(())
    }

    /// Move to `position` and drop whatever the suction cup holds.
    pub fn release_at(&mut self, position: Position) -> Result<(), PickingError> {
        self.arm.move_to(position, MotionMode::JointXyz, true)?;
        self.arm.set_suction(false)?;
        settle(self.config.motion.release_settle_ms);
        Ok(())
    }

    /// Pick at `source`, pass through `waypoints`, release at `destination`.
    pub fn carry(
        &mut self,
        source: Position,
        waypoints: &[Position],
        destination: Position,
    ) -> Result<(), PickingError> {
        self.pick_at(source)?;
        for &w in waypoints {
            self.arm.move_to(w, MotionMode::JointXyz, true)?;
        }
        self.release_at(destination)
    }

    /// Pair marker centres with operator-jogged arm positions and refit the
    /// coordinate model.
    pub fn calibrate_coordinate_transformer(
        &mut self,
        operator: &mut impl Operator,
    ) -> Result<Vec<CalibrationSample>, PickingError> {
        if self.detector.is_none() {
            return Err(PickingError::NoDictionary);
        }
        operator.await_markers_placed()?;
        let frame = self.capture_bulk()?;
        let detector = self.detector.as_ref().ok_or(PickingError::NoDictionary)?;
        let centers = detector.detect_markers(&to_gray(&frame).view());
        let ids: Vec<u32> = centers.keys().copied().collect();
        operator.markers_detected(&ids);
        if centers.is_empty() {
            return Err(PickingError::NoMarkers);
        }
        info!("detected marker ids {ids:?}");

        let mut samples = Vec::with_capacity(centers.len());
        for (id, center) in centers {
            operator.await_arm_over_marker(id, center)?;
            let pose = self.arm.current_pose()?;
            debug!("marker {id}: image {center:?} -> arm ({:.1}, {:.1})", pose.x, pose.y);
            samples.push(CalibrationSample::new(
                Point2::new(center.x as f64, center.y as f64),
                Point2::new(pose.x, pose.y),
            ));
        }

        self.transformer.fit(&samples)?;
        info!("coordinate transformer has been calibrated");
        Ok(samples)
    }
}
