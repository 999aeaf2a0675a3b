//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::mech::{JointVector, MechDems, NUM_ARM_JOINTS};
use log::{debug, info, warn};
use nalgebra::Point3;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

// Internal
use super::{
    fmt_point,
    safety::{validate_base_exclusion, validate_ground_plane, validate_joint_limits},
    ArmCtrlError, ArmState, CartesianPose, Kinematics, MotionState, Params,
};
use crate::mech_client::{MechClientError, MechLink};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Joint angles of the home position.
pub const HOME_POS_RAD: [f64; NUM_ARM_JOINTS] = [0.0; NUM_ARM_JOINTS];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state.
///
/// All commands block until the arm has arrived or the command has failed. The mechanisms link and
/// the arm state are held under a single lock for the whole of a command, so commands issued from
/// different threads execute one after the other.
pub struct ArmCtrl {
    pub(super) params: Params,

    pub(super) kin: Box<dyn Kinematics>,

    pub(super) inner: Mutex<Inner>,
}

/// Lock-protected part of the controller.
pub(super) struct Inner {
    pub(super) link: Box<dyn MechLink>,

    pub(super) state: ArmState,

    pub(super) motion: MotionState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmCtrl {
    /// Create a new controller using the given kinematics and mechanisms link.
    pub fn new(params: Params, kin: Box<dyn Kinematics>, link: Box<dyn MechLink>) -> Self {
        Self {
            params,
            kin,
            inner: Mutex::new(Inner {
                link,
                state: ArmState::default(),
                motion: MotionState::Idle,
            }),
        }
    }

    /// Get the arm state as of the last successful motion.
    pub fn arm_state(&self) -> ArmState {
        self.lock().state
    }

    /// Get the progress of the last motion command.
    pub fn motion_state(&self) -> MotionState {
        self.lock().motion
    }

    /// Read the measured joints from the mechanisms.
    ///
    /// The gripper value is the last commanded one, as the gripper has no position sensor.
    pub fn measured_joints(&self) -> Result<JointVector, ArmCtrlError> {
        let mut inner = self.lock();
        Ok(inner.read_joints()?)
    }

    /// Compute the current gripper pose from freshly measured joints.
    pub fn gripper_pose(&self) -> Result<CartesianPose, ArmCtrlError> {
        let joints = self.measured_joints()?;
        Ok(self.kin.forward(&joints))
    }

    /// Move the gripper to the given position in the base frame.
    ///
    /// The target is checked against the cartesian limits, then the joint solution is found by
    /// inverse kinematics seeded with the current joints, with the wrist set to `gripper_yaw_rad`,
    /// and checked against the joint limits. Nothing is sent unless every check passes.
    pub fn move_to(&self, target_m: Point3<f64>, gripper_yaw_rad: f64) -> Result<(), ArmCtrlError> {
        let mut inner = self.lock();
        inner.set_motion(MotionState::Validating);

        if let Err(e) = self.validate_target(&target_m) {
            inner.set_motion(MotionState::Rejected);
            return Err(e);
        }

        let current = inner.read_joints().map_err(|e| inner.fault(e))?;

        let mut solution = match self.kin.inverse(&target_m, gripper_yaw_rad, &current) {
            Some(s) => s,
            None => {
                inner.set_motion(MotionState::Rejected);
                return Err(ArmCtrlError::NoIkSolution(target_m));
            }
        };
        solution.pos_rad[3] = gripper_yaw_rad;
        solution.gripper = current.gripper;

        if let Err(e) = validate_joint_limits(&solution, &self.params.joint_limits) {
            inner.set_motion(MotionState::Rejected);
            return Err(e.into());
        }

        info!(
            "Moving to {} (yaw {:.3} rad)",
            fmt_point(&target_m),
            gripper_yaw_rad
        );
        self.command(&mut inner, &solution, &target_m)
    }

    /// Move the joints to the given angles.
    ///
    /// The resulting gripper position is checked against the cartesian limits, and the joints
    /// against their ranges, before any demand is sent.
    pub fn move_to_joints(&self, joints: JointVector) -> Result<(), ArmCtrlError> {
        let mut inner = self.lock();
        inner.set_motion(MotionState::Validating);

        let target_m = self.kin.forward(&joints).position_m;

        if let Err(e) = self.validate(&target_m, &joints) {
            inner.set_motion(MotionState::Rejected);
            return Err(e);
        }

        info!(
            "Moving to joints {:?} rad, gripper at {}",
            joints.pos_rad,
            fmt_point(&target_m)
        );
        self.command(&mut inner, &joints, &target_m)
    }

    /// Move every joint to zero.
    ///
    /// The home position lies within the base exclusion zone, so it is not validated.
    pub fn move_home(&self) -> Result<(), ArmCtrlError> {
        let mut inner = self.lock();

        let home = JointVector::new(HOME_POS_RAD, inner.state.joints.gripper);
        let target_m = self.kin.forward(&home).position_m;

        info!("Moving home");
        self.command(&mut inner, &home, &target_m)
    }

    /// Open or close the gripper, holding the arm at its measured position.
    ///
    /// Blocks for the gripper settle time.
    pub fn set_gripper(&self, closed: bool) -> Result<(), ArmCtrlError> {
        let mut inner = self.lock();

        let gripper = if closed {
            self.params.gripper_closed
        } else {
            self.params.gripper_open
        };

        let sens = inner.link.read_measured_state()?;
        inner.write(&MechDems {
            pos_rad: sens.pos_rad,
            gripper,
        })?;

        info!("Gripper {}", if closed { "closing" } else { "opening" });
        thread::sleep(self.params.gripper_settle());

        inner.state.joints.gripper = gripper;

        Ok(())
    }

    /// Run every safety check, in order, on a target and its joint solution.
    fn validate(&self, target_m: &Point3<f64>, joints: &JointVector) -> Result<(), ArmCtrlError> {
        self.validate_target(target_m)?;
        validate_joint_limits(joints, &self.params.joint_limits)?;

        Ok(())
    }

    /// Check a cartesian target against the base exclusion zone and the ground plane.
    fn validate_target(&self, target_m: &Point3<f64>) -> Result<(), ArmCtrlError> {
        validate_base_exclusion(
            target_m,
            &self.params.exclusion_zone,
            self.params.exclusion_margin_m,
        )?;
        validate_ground_plane(target_m)?;

        Ok(())
    }

    /// Send the demands and wait for the arm to arrive at `target_m`.
    fn command(
        &self,
        inner: &mut Inner,
        joints: &JointVector,
        target_m: &Point3<f64>,
    ) -> Result<(), ArmCtrlError> {
        inner.set_motion(MotionState::Commanding);

        if let Err(e) = inner.write(&MechDems::from(*joints)) {
            return Err(inner.fault(e));
        }

        self.wait_locked(
            inner,
            target_m,
            self.params.arrival_timeout(),
            self.params.arrival_threshold_m,
        )
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    pub(super) fn set_motion(&mut self, motion: MotionState) {
        debug!("Motion state {:?} -> {:?}", self.motion, motion);
        self.motion = motion;
    }

    /// End the current command on a mechanisms failure.
    pub(super) fn fault(&mut self, err: MechClientError) -> ArmCtrlError {
        warn!("Motion aborted by mechanisms failure: {}", err);
        self.set_motion(MotionState::Faulted);
        err.into()
    }

    /// Read the measured joints, carrying over the last commanded gripper value.
    pub(super) fn read_joints(&mut self) -> Result<JointVector, MechClientError> {
        let sens = self.link.read_measured_state()?;
        Ok(JointVector::new(sens.pos_rad, self.state.joints.gripper))
    }

    /// Write demands, checking the link first.
    fn write(&mut self, dems: &MechDems) -> Result<(), MechClientError> {
        if !self.link.connection_valid() {
            return Err(MechClientError::NotConnected);
        }

        self.link.write_command(dems)
    }
}
