//! # Simulation Client
//!
//! The simulation client stands in for the arm hardware, the camera and the object detector so
//! that the whole pipeline can run without any equipment. It provides:
//!
//! - [`SimMech`], a mechanisms link whose joints slew towards the demanded angles at a fixed rate,
//!   advancing one simulation step on every read.
//! - [`SimCam`], a camera rendering a synthetic depth scene.
//! - [`SimDetector`], a detector reporting every scene object in view.
//!
//! Objects in the scene are only in view when the arm's base is turned towards them. The camera
//! and detector read the base angle from the shared [`SimMechState`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use comms_if::eqpt::{
    cam::{CamIntrinsics, FramePair},
    det::{BBox, RawDetection},
    mech::{MechDems, MechSensData, NUM_ARM_JOINTS},
};
use image::{ImageBuffer, Luma, Rgb, RgbImage};
use log::trace;
use serde::Deserialize;

use crate::{
    cam_client::{CamClientError, CamSource},
    det_client::{DetClientError, Detector},
    mech_client::{MechClientError, MechLink},
};
use util::maths::wrap_pi;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Maximum rate of every joint.
    ///
    /// Units: radians/second
    pub joint_rate_rads: f64,

    /// Simulated time advanced on each read of the measured state.
    ///
    /// Units: seconds
    pub step_s: f64,

    pub intrinsics: CamIntrinsics,

    /// Units: pixels
    pub image_width: u32,

    /// Units: pixels
    pub image_height: u32,

    /// Raw depth of everything that isn't an object.
    pub background_depth_raw: u16,

    /// Maximum difference between the base angle and an object's bearing for it to be in view.
    ///
    /// Units: radians
    pub visibility_rad: f64,

    pub objects: Vec<SimObject>,
}

/// An object in the simulated scene.
#[derive(Debug, Clone, Deserialize)]
pub struct SimObject {
    pub label: String,

    /// Base angle at which the object is centred in view.
    ///
    /// Units: radians
    pub bearing_rad: f64,

    /// Where the object appears in the image.
    pub bbox: BBox,

    /// Raw depth of the object surface. Only the central half of the box is filled, the rest
    /// shows the background.
    pub depth_raw: u16,

    pub confidence: f64,
}

/// State of the simulated mechanisms, shared with the simulated camera and detector.
#[derive(Debug, Clone)]
pub struct SimMechState {
    pub pos_rad: [f64; NUM_ARM_JOINTS],

    pub target_rad: [f64; NUM_ARM_JOINTS],

    pub gripper: f64,

    /// Value returned by `connection_valid`.
    pub connected: bool,

    /// If true every read fails.
    pub read_fails: bool,

    /// If true the joints never move.
    pub frozen: bool,

    /// Rate reported by joints which have reached their target. Any non-zero value means the arm
    /// never appears to come to rest.
    ///
    /// Units: radians/second
    pub creep_rads: f64,

    /// Number of demands received.
    pub num_writes: usize,
}

pub type SharedSimMechState = Arc<Mutex<SimMechState>>;

/// Simulated mechanisms link.
pub struct SimMech {
    state: SharedSimMechState,

    max_step_rad: f64,

    step_s: f64,
}

/// Simulated camera.
pub struct SimCam {
    state: SharedSimMechState,

    params: SimParams,
}

/// Simulated object detector.
pub struct SimDetector {
    state: SharedSimMechState,

    params: SimParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            joint_rate_rads: 1.5,
            step_s: 0.1,
            intrinsics: CamIntrinsics {
                fx: 615.0,
                fy: 615.0,
                cx: 320.0,
                cy: 240.0,
                depth_scale: 0.001,
            },
            image_width: 640,
            image_height: 480,
            background_depth_raw: 900,
            visibility_rad: 0.35,
            objects: vec![
                SimObject {
                    label: "cube".into(),
                    bearing_rad: 0.0,
                    bbox: BBox::new(280.0, 200.0, 360.0, 280.0),
                    depth_raw: 420,
                    confidence: 0.91,
                },
                SimObject {
                    label: "cup".into(),
                    bearing_rad: 40f64.to_radians(),
                    bbox: BBox::new(150.0, 220.0, 250.0, 340.0),
                    depth_raw: 510,
                    confidence: 0.78,
                },
                SimObject {
                    label: "ball".into(),
                    bearing_rad: -120f64.to_radians(),
                    bbox: BBox::new(400.0, 180.0, 460.0, 240.0),
                    depth_raw: 380,
                    confidence: 0.66,
                },
            ],
        }
    }
}

impl Default for SimMechState {
    fn default() -> Self {
        Self {
            pos_rad: [0.0; NUM_ARM_JOINTS],
            target_rad: [0.0; NUM_ARM_JOINTS],
            gripper: 0.0,
            connected: true,
            read_fails: false,
            frozen: false,
            creep_rads: 0.0,
            num_writes: 0,
        }
    }
}

impl SimMech {
    /// Create a new simulated arm at the home position.
    pub fn new(params: &SimParams) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimMechState::default())),
            max_step_rad: params.joint_rate_rads * params.step_s,
            step_s: params.step_s,
        }
    }

    /// Get a handle to the simulation state.
    pub fn state(&self) -> SharedSimMechState {
        self.state.clone()
    }
}

impl MechLink for SimMech {
    fn read_measured_state(&mut self) -> Result<MechSensData, MechClientError> {
        let mut state = lock(&self.state);

        if state.read_fails {
            return Err(MechClientError::RecvError("simulated read failure".into()));
        }

        let mut speed_rads = [0.0; NUM_ARM_JOINTS];

        for i in 0..NUM_ARM_JOINTS {
            let delta = state.target_rad[i] - state.pos_rad[i];

            if state.frozen {
                continue;
            }

            if delta == 0.0 {
                speed_rads[i] = state.creep_rads;
            } else {
                let step = delta.max(-self.max_step_rad).min(self.max_step_rad);
                state.pos_rad[i] += step;
                speed_rads[i] = step / self.step_s;
            }

            if (state.target_rad[i] - state.pos_rad[i]).abs() < 1e-12 {
                state.pos_rad[i] = state.target_rad[i];
            }
        }

        trace!("Sim arm at {:?} rad", state.pos_rad);

        Ok(MechSensData {
            pos_rad: state.pos_rad,
            speed_rads,
        })
    }

    fn write_command(&mut self, dems: &MechDems) -> Result<(), MechClientError> {
        let mut state = lock(&self.state);

        if !state.connected {
            return Err(MechClientError::NotConnected);
        }

        state.target_rad = dems.pos_rad;
        state.gripper = dems.gripper;
        state.num_writes += 1;

        Ok(())
    }

    fn connection_valid(&mut self) -> bool {
        lock(&self.state).connected
    }
}

impl SimCam {
    pub fn new(params: &SimParams, state: SharedSimMechState) -> Self {
        Self {
            state,
            params: params.clone(),
        }
    }
}

impl CamSource for SimCam {
    fn get_frame_pair(&mut self) -> Result<Option<FramePair>, CamClientError> {
        let base_rad = lock(&self.state).pos_rad[0];
        let (w, h) = (self.params.image_width, self.params.image_height);

        let mut colour = RgbImage::from_pixel(w, h, Rgb([90, 90, 90]));
        let mut depth = ImageBuffer::from_pixel(w, h, Luma([self.params.background_depth_raw]));

        for obj in visible(&self.params, base_rad) {
            let (u0, v0, u1, v1) = match obj.bbox.pixel_bounds(w, h) {
                Some(b) => b,
                None => continue,
            };

            // Fill the central half of the box
            let (du, dv) = ((u1 - u0) / 4, (v1 - v0) / 4);
            for v in (v0 + dv)..(v1 - dv) {
                for u in (u0 + du)..(u1 - du) {
                    depth.put_pixel(u, v, Luma([obj.depth_raw]));
                    colour.put_pixel(u, v, Rgb([200, 60, 40]));
                }
            }
        }

        Ok(Some(FramePair {
            timestamp: Utc::now(),
            colour,
            depth,
        }))
    }

    fn get_intrinsics(&self) -> CamIntrinsics {
        self.params.intrinsics
    }
}

impl SimDetector {
    pub fn new(params: &SimParams, state: SharedSimMechState) -> Self {
        Self {
            state,
            params: params.clone(),
        }
    }
}

impl Detector for SimDetector {
    fn detect(&mut self, _image: &RgbImage) -> Result<Vec<RawDetection>, DetClientError> {
        let base_rad = lock(&self.state).pos_rad[0];

        Ok(visible(&self.params, base_rad)
            .map(|obj| RawDetection {
                bbox: obj.bbox,
                label: obj.label.clone(),
                confidence: obj.confidence,
            })
            .collect())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn lock(state: &SharedSimMechState) -> MutexGuard<'_, SimMechState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Objects in view with the base at `base_rad`.
fn visible(params: &SimParams, base_rad: f64) -> impl Iterator<Item = &SimObject> {
    let limit = params.visibility_rad;
    params
        .objects
        .iter()
        .filter(move |obj| wrap_pi(base_rad - obj.bearing_rad).abs() <= limit)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slew() {
        let mut mech = SimMech::new(&SimParams::default());

        mech.write_command(&MechDems {
            pos_rad: [0.2, -0.1, 0.0, 0.0],
            gripper: 1.0,
        })
        .unwrap();

        // First read moves one full step on the base
        let sens = mech.read_measured_state().unwrap();
        assert!((sens.pos_rad[0] - 0.15).abs() < 1e-12);
        assert!((sens.speed_rads[0] - 1.5).abs() < 1e-12);
        assert_eq!(sens.pos_rad[1], -0.1);
        assert!(!sens.is_stationary());

        // The read on which the base arrives still shows motion
        let sens = mech.read_measured_state().unwrap();
        assert_eq!(sens.pos_rad[0], 0.2);
        assert!(!sens.is_stationary());

        let sens = mech.read_measured_state().unwrap();
        assert!(sens.is_stationary());
        assert_eq!(mech.state().lock().unwrap().num_writes, 1);
    }

    #[test]
    fn test_shipped_params() {
        let params: SimParams =
            util::params::parse(include_str!("../../params/sim.toml")).unwrap();

        assert_eq!(params.objects.len(), 3);
        assert_eq!(params.objects[1].label, "cup");
        assert_eq!(params.objects[1].bbox, BBox::new(150.0, 220.0, 250.0, 340.0));
        assert_eq!(params.intrinsics, SimParams::default().intrinsics);
    }

    #[test]
    fn test_visibility() {
        let params = SimParams::default();
        let mech = SimMech::new(&params);
        let mut det = SimDetector::new(&params, mech.state());
        let mut cam = SimCam::new(&params, mech.state());

        let dets = det.detect(&RgbImage::new(1, 1)).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "cube");

        let frames = cam.get_frame_pair().unwrap().unwrap();
        assert!(frames.is_aligned());
        assert_eq!(frames.depth.get_pixel(320, 240).0[0], 420);
        assert_eq!(frames.depth.get_pixel(281, 201).0[0], 900);

        mech.state().lock().unwrap().pos_rad[0] = -2.0;
        let dets = det.detect(&RgbImage::new(1, 1)).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "ball");

        mech.state().lock().unwrap().pos_rad[0] = 1.5;
        assert!(det.detect(&RgbImage::new(1, 1)).unwrap().is_empty());
    }
}
