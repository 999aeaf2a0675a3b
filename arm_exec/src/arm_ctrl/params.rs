//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;

use super::{
    safety::{ExclusionZone, JointLimits},
    ArmGeometry,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Link geometry used by the analytic kinematics model.
    pub geometry: ArmGeometry,

    // ---- SAFETY ----
    /// No-go volume around the arm's base.
    pub exclusion_zone: ExclusionZone,

    /// Extra clearance added to every side of the exclusion zone.
    ///
    /// Units: meters
    pub exclusion_margin_m: f64,

    /// Allowed joint ranges.
    pub joint_limits: JointLimits,

    // ---- CONVERGENCE ----
    /// Maximum time to wait for each phase of arrival (reaching the target, then coming to rest).
    ///
    /// Units: seconds
    pub arrival_timeout_s: f64,

    /// Distance from the target below which the arm is considered to have reached it.
    ///
    /// Units: meters
    pub arrival_threshold_m: f64,

    /// Period between reads of the measured arm state while waiting for arrival.
    ///
    /// Units: seconds
    pub poll_period_s: f64,

    // ---- GRIPPER ----
    /// Actuator value for an open gripper.
    pub gripper_open: f64,

    /// Actuator value for a closed gripper.
    pub gripper_closed: f64,

    /// Time allowed for the gripper to open or close. There is no feedback on the gripper
    /// position so this is a fixed delay.
    ///
    /// Units: seconds
    pub gripper_settle_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            geometry: ArmGeometry::default(),
            exclusion_zone: ExclusionZone::default(),
            exclusion_margin_m: 0.005,
            joint_limits: JointLimits::default(),
            arrival_timeout_s: 10.0,
            arrival_threshold_m: 0.05,
            poll_period_s: 0.1,
            gripper_open: 0.0,
            gripper_closed: 1.0,
            gripper_settle_s: 1.0,
        }
    }
}

impl Params {
    pub fn arrival_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.arrival_timeout_s.max(0.0))
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs_f64(self.poll_period_s.max(0.0))
    }

    pub fn gripper_settle(&self) -> Duration {
        Duration::from_secs_f64(self.gripper_settle_s.max(0.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: Params =
            util::params::parse(include_str!("../../../params/arm_ctrl.toml")).unwrap();

        assert_eq!(params.joint_limits.max_deg, [170.0, 85.0, 75.0, 160.0]);
        assert_eq!(params.exclusion_zone.half_width_m, 0.11);
        assert_eq!(params.geometry.elbow_length_m, 0.2);
        assert_eq!(params.poll_period(), Duration::from_millis(100));
    }

    #[test]
    fn test_missing_values_default() {
        let params: Params = util::params::parse("arrival_timeout_s = 2.5").unwrap();

        assert_eq!(params.arrival_timeout(), Duration::from_millis(2500));
        assert_eq!(params.arrival_threshold_m, 0.05);
        assert_eq!(params.exclusion_margin_m, 0.005);
    }
}
