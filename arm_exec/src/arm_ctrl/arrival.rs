//! Arrival detection for commanded motions
//!
//! Arrival happens in two phases. First the gripper must come within a distance threshold of the
//! target, then every joint must stop moving. A physical arm can pass through the threshold while
//! still decelerating, so being close is not enough on its own.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::JointVector;
use log::{debug, info, warn};
use nalgebra::Point3;
use std::thread;
use std::time::{Duration, Instant};

use super::{fmt_point, state::Inner, ArmCtrl, ArmCtrlError, ArmState, MotionState, Phase};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmCtrl {
    /// Wait for the arm to arrive at `target_m` and come to rest.
    ///
    /// Each phase may take up to `timeout`. The arm state is only updated once both phases
    /// succeed, and a failed read ends the wait with the motion faulted.
    pub fn wait_until_arrived(
        &self,
        target_m: &Point3<f64>,
        timeout: Duration,
        threshold_m: f64,
    ) -> Result<(), ArmCtrlError> {
        let mut inner = self.lock();
        self.wait_locked(&mut inner, target_m, timeout, threshold_m)
    }

    pub(super) fn wait_locked(
        &self,
        inner: &mut Inner,
        target_m: &Point3<f64>,
        timeout: Duration,
        threshold_m: f64,
    ) -> Result<(), ArmCtrlError> {
        let poll_period = self.params.poll_period();
        let gripper = inner.state.joints.gripper;

        // ---- PHASE 1: POSITION ----

        inner.set_motion(MotionState::Converging(Phase::Position));
        let start = Instant::now();

        loop {
            let sens = inner.link.read_measured_state().map_err(|e| inner.fault(e))?;
            let measured_m = self
                .kin
                .forward(&JointVector::new(sens.pos_rad, gripper))
                .position_m;
            let dist_m = (measured_m - *target_m).norm();

            if dist_m <= threshold_m {
                debug!(
                    "Within {:.3} m of target after {:.2} s",
                    dist_m,
                    start.elapsed().as_secs_f64()
                );
                break;
            }

            if start.elapsed() >= timeout {
                inner.set_motion(MotionState::ArrivalTimeout);
                let err = ArmCtrlError::ArrivalTimeout {
                    measured_m,
                    target_m: *target_m,
                    timeout_s: timeout.as_secs_f64(),
                };
                warn!("{}", err);
                return Err(err);
            }

            thread::sleep(poll_period);
        }

        // ---- PHASE 2: STATIONARY ----

        inner.set_motion(MotionState::Converging(Phase::Stationary));
        let start = Instant::now();

        loop {
            let sens = inner.link.read_measured_state().map_err(|e| inner.fault(e))?;

            if sens.is_stationary() {
                let joints = JointVector::new(sens.pos_rad, gripper);
                let pose = self.kin.forward(&joints);

                inner.state = ArmState {
                    joints,
                    pose: Some(pose),
                };
                inner.set_motion(MotionState::Arrived);

                info!("Arrived at {}", fmt_point(&pose.position_m));
                return Ok(());
            }

            if start.elapsed() >= timeout {
                inner.set_motion(MotionState::StationaryTimeout);
                let err = ArmCtrlError::StationaryTimeout {
                    speed_rads: sens.speed_rads,
                    target_m: *target_m,
                    timeout_s: timeout.as_secs_f64(),
                };
                warn!("{}", err);
                return Err(err);
            }

            thread::sleep(poll_period);
        }
    }
}
