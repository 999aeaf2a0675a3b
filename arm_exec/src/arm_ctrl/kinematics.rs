//! Arm kinematics
//!
//! The [`Kinematics`] trait is the boundary to the kinematics service. [`ArmGeometry`] provides an
//! analytic model for a base-yaw, shoulder-pitch, elbow-pitch, wrist-roll arm.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::JointVector;
use log::trace;
use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Forward and inverse kinematics of the arm.
pub trait Kinematics: Send + Sync {
    /// Compute the gripper pose in the base frame for the given joints.
    fn forward(&self, joints: &JointVector) -> CartesianPose;

    /// Compute joints placing the gripper at `target_m` with the given yaw, choosing the solution
    /// nearest `seed`. Returns `None` if the target cannot be reached.
    fn inverse(
        &self,
        target_m: &Point3<f64>,
        target_yaw_rad: f64,
        seed: &JointVector,
    ) -> Option<JointVector>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose of the gripper in the arm base frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CartesianPose {
    /// Units: meters,
    /// Frame: Arm base
    pub position_m: Point3<f64>,

    /// Rotation from the gripper frame into the base frame.
    pub rotation: Rotation3<f64>,

    /// Yaw of the gripper about its own axis.
    ///
    /// Units: radians
    pub gripper_yaw_rad: f64,
}

/// Link geometry of the arm.
///
/// The shoulder and elbow angles are measured from vertical, positive tilting away from the base
/// axis. The wrist rolls the gripper about the forearm and does not move the gripper position.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ArmGeometry {
    /// Height of the shoulder axis above the base frame origin.
    ///
    /// Units: meters
    pub base_height_m: f64,

    /// Shoulder to elbow length.
    ///
    /// Units: meters
    pub shoulder_length_m: f64,

    /// Elbow to gripper length.
    ///
    /// Units: meters
    pub elbow_length_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ArmGeometry {
    fn default() -> Self {
        Self {
            base_height_m: 0.077,
            shoulder_length_m: 0.15,
            elbow_length_m: 0.2,
        }
    }
}

impl Kinematics for ArmGeometry {
    fn forward(&self, joints: &JointVector) -> CartesianPose {
        let [base, shoulder, elbow, wrist] = joints.pos_rad;

        let reach_m = self.shoulder_length_m * shoulder.sin()
            + self.elbow_length_m * (shoulder + elbow).sin();
        let height_m = self.base_height_m
            + self.shoulder_length_m * shoulder.cos()
            + self.elbow_length_m * (shoulder + elbow).cos();

        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), base)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), shoulder + elbow)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), wrist);

        CartesianPose {
            position_m: Point3::new(reach_m * base.cos(), reach_m * base.sin(), height_m),
            rotation,
            gripper_yaw_rad: wrist,
        }
    }

    fn inverse(
        &self,
        target_m: &Point3<f64>,
        target_yaw_rad: f64,
        seed: &JointVector,
    ) -> Option<JointVector> {
        let l1 = self.shoulder_length_m;
        let l2 = self.elbow_length_m;

        let reach_m = (target_m.x.powi(2) + target_m.y.powi(2)).sqrt();
        let height_m = target_m.z - self.base_height_m;

        // On the base axis any base angle works, so keep the current one
        let base = if reach_m < 1e-9 {
            seed.pos_rad[0]
        } else {
            target_m.y.atan2(target_m.x)
        };

        // Law of cosines for the elbow
        let dist_sq = reach_m.powi(2) + height_m.powi(2);
        let cos_elbow = (dist_sq - l1.powi(2) - l2.powi(2)) / (2.0 * l1 * l2);
        if !cos_elbow.is_finite() || cos_elbow.abs() > 1.0 + 1e-9 {
            return None;
        }
        let elbow_mag = cos_elbow.max(-1.0).min(1.0).acos();

        // Of the two elbow solutions pick the one which moves the arm the least from the seed
        let target_angle = reach_m.atan2(height_m);
        let mut best: Option<(f64, f64, f64)> = None;
        for elbow in [elbow_mag, -elbow_mag].iter() {
            let shoulder = wrap_pi(
                target_angle - (l2 * elbow.sin()).atan2(l1 + l2 * elbow.cos()),
            );
            let cost = (shoulder - seed.pos_rad[1]).abs() + (elbow - seed.pos_rad[2]).abs();

            trace!(
                "IK candidate shoulder {:.4} rad, elbow {:.4} rad, cost {:.4}",
                shoulder,
                elbow,
                cost
            );

            if best.map_or(true, |b| cost < b.2) {
                best = Some((shoulder, *elbow, cost));
            }
        }

        best.map(|(shoulder, elbow, _)| {
            JointVector::new([base, shoulder, elbow, target_yaw_rad], seed.gripper)
        })
    }
}
