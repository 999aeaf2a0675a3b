//! # Scan module
//!
//! Sweeps the arm's base through a fixed set of angles, localising the objects seen at each stop,
//! and merges the observations into a single set of objects.
//!
//! A failure at one stop is logged and the sweep carries on, but failing to reach the scan-ready
//! pose before the sweep, or home after it, fails the whole scan.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod dedup;
mod params;
mod sink;

pub use dedup::*;
pub use params::ScanParams;
pub use sink::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{
    det::Detection,
    mech::{ActId, JointVector},
};
use log::{error, info, warn};
use nalgebra::Point3;
use serde::Serialize;

use crate::{
    arm_ctrl::{ArmCtrl, ArmCtrlError},
    cam_client::{CamClient, CamClientError},
    det_client::{DetClientError, Detector},
    frame_tf::FrameTf,
    per::{PerError, PerMgr},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs scans of the workspace.
pub struct ScanMgr {
    pub params: ScanParams,

    per: PerMgr,

    frame_tf: FrameTf,
}

/// A detection along with where it was seen from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScanRecord {
    /// Identifier of the image the detection was made in.
    pub image_id: String,

    /// Commanded base angle of the stop.
    ///
    /// Units: radians
    pub angle_rad: f64,

    /// Measured joints when the image was captured.
    pub joints: JointVector,

    pub detection: Detection,
}

/// The objects found by a scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    /// One record per object, in the order they were first seen.
    pub records: Vec<ScanRecord>,

    /// Number of stops at which the sweep failed.
    pub num_failed_angles: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Could not prepare the arm for scanning: {0}")]
    Prepare(ArmCtrlError),

    #[error("Could not return the arm home after scanning: {0}")]
    Finish(ArmCtrlError),
}

/// Failures at a single stop of the sweep.
#[derive(Debug, thiserror::Error)]
pub enum StopError {
    #[error("Motion failed: {0}")]
    Motion(#[from] ArmCtrlError),

    #[error("Acquisition failed: {0}")]
    Camera(#[from] CamClientError),

    #[error("Detection failed: {0}")]
    Detector(#[from] DetClientError),

    #[error("Localisation failed: {0}")]
    Localisation(#[from] PerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AsRef<Detection> for ScanRecord {
    fn as_ref(&self) -> &Detection {
        &self.detection
    }
}

impl ScanResult {
    pub fn detections(&self) -> impl Iterator<Item = &Detection> {
        self.records.iter().map(|r| &r.detection)
    }

    /// Flatten every record for persistence.
    pub fn flat_records(&self) -> Vec<FlatScanRecord> {
        self.records
            .iter()
            .map(|r| {
                let d = &r.detection;
                let [base_rad, shoulder_rad, elbow_rad, wrist_rad] = r.joints.pos_rad;

                FlatScanRecord {
                    image_id: r.image_id.clone(),
                    angle_rad: r.angle_rad,
                    label: d.label.clone(),
                    confidence: d.confidence,
                    bbox_x_min: d.bbox.x_min,
                    bbox_y_min: d.bbox.y_min,
                    bbox_x_max: d.bbox.x_max,
                    bbox_y_max: d.bbox.y_max,
                    grasp_x_m: d.grasp_point_m.x,
                    grasp_y_m: d.grasp_point_m.y,
                    grasp_z_m: d.grasp_point_m.z,
                    base_rad,
                    shoulder_rad,
                    elbow_rad,
                    wrist_rad,
                    gripper: r.joints.gripper,
                }
            })
            .collect()
    }
}

impl ScanMgr {
    pub fn new(params: ScanParams, per: PerMgr, frame_tf: FrameTf) -> Self {
        Self {
            params,
            per,
            frame_tf,
        }
    }

    /// Scan the workspace, stopping at each of `sweep_angles_rad` in turn.
    pub fn run_scan(
        &self,
        arm: &ArmCtrl,
        cam: &mut CamClient,
        det: &mut dyn Detector,
        sweep_angles_rad: &[f64],
        confidence_threshold: f64,
    ) -> Result<ScanResult, ScanError> {
        info!("Starting scan of {} angles", sweep_angles_rad.len());

        let ready = self.prepare(arm).map_err(|e| {
            error!("Scan preparation failed: {}", e);
            ScanError::Prepare(e)
        })?;

        let mut records = Vec::new();
        let mut num_failed_angles = 0;

        for (index, &angle_rad) in sweep_angles_rad.iter().enumerate() {
            match self.scan_stop(arm, cam, det, &ready, index, angle_rad, confidence_threshold) {
                Ok(mut stop_records) => {
                    info!(
                        "{} detections at {:.1} deg",
                        stop_records.len(),
                        angle_rad.to_degrees()
                    );
                    records.append(&mut stop_records);
                }
                Err(e) => {
                    warn!(
                        "Skipping stop {} at {:.1} deg: {}",
                        index,
                        angle_rad.to_degrees(),
                        e
                    );
                    num_failed_angles += 1;
                }
            }
        }

        let num_raw = records.len();
        let records = suppress_duplicates(records, self.params.duplicate_threshold_m);
        info!(
            "Scan found {} objects ({} detections, {} failed stops)",
            records.len(),
            num_raw,
            num_failed_angles
        );

        arm.move_home().map_err(|e| {
            error!("Could not return home after the scan: {}", e);
            ScanError::Finish(e)
        })?;

        Ok(ScanResult {
            records,
            num_failed_angles,
        })
    }

    /// Home the arm, open the gripper and move to the scan-ready pose, returning the joints at
    /// that pose.
    fn prepare(&self, arm: &ArmCtrl) -> Result<JointVector, ArmCtrlError> {
        let [x, y, z] = self.params.scan_ready_position_m;

        arm.move_home()?;
        arm.set_gripper(false)?;
        arm.move_to(Point3::new(x, y, z), self.params.scan_ready_yaw_rad)?;

        Ok(arm.arm_state().joints)
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_stop(
        &self,
        arm: &ArmCtrl,
        cam: &mut CamClient,
        det: &mut dyn Detector,
        ready: &JointVector,
        index: usize,
        angle_rad: f64,
        confidence_threshold: f64,
    ) -> Result<Vec<ScanRecord>, StopError> {
        arm.move_to_joints(ready.with(ActId::ArmBase, angle_rad))?;

        let frames = cam.acquire()?;
        let joints = arm.measured_joints()?;
        let raw = det.detect(&frames.colour)?;

        let detections = self.per.localise(
            &frames,
            &cam.intrinsics(),
            &raw,
            confidence_threshold,
            &self.frame_tf,
            arm,
        )?;

        let image_id = frames.image_id(index);

        Ok(detections
            .into_iter()
            .map(|detection| ScanRecord {
                image_id: image_id.clone(),
                angle_rad,
                joints,
                detection,
            })
            .collect())
    }
}
