//! # Mechanisms Equipment Data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of positioning joints on the arm (excludes the gripper).
pub const NUM_ARM_JOINTS: usize = 4;

const ARM_IDS: [ActId; NUM_ARM_JOINTS] = [
    ActId::ArmBase,
    ActId::ArmShoulder,
    ActId::ArmElbow,
    ActId::ArmWrist,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A full joint-space description of the arm: the four positioning joints plus the independent
/// gripper actuator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct JointVector {
    /// Angles of the positioning joints, ordered as [`ActId::arm_ids`].
    ///
    /// Units: radians
    pub pos_rad: [f64; NUM_ARM_JOINTS],

    /// Gripper actuator value. Open/close state only, no position feedback exists.
    pub gripper: f64,
}

/// Demands that are sent to the mechanisms.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct MechDems {
    /// Demanded joint positions.
    ///
    /// Units: radians
    pub pos_rad: [f64; NUM_ARM_JOINTS],

    /// Demanded gripper value.
    pub gripper: f64,
}

/// Sensor data measured by the mechanisms.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct MechSensData {
    /// Measured joint positions.
    ///
    /// Units: radians
    pub pos_rad: [f64; NUM_ARM_JOINTS],

    /// Measured joint rates.
    ///
    /// Units: radians/second
    pub speed_rads: [f64; NUM_ARM_JOINTS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all actuators on the arm
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ActId {
    ArmBase,
    ArmShoulder,
    ArmElbow,
    ArmWrist,
    ArmGripper,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl ActId {
    /// The positioning joints in command order.
    pub fn arm_ids() -> &'static [ActId; NUM_ARM_JOINTS] {
        &ARM_IDS
    }

    /// Index of this actuator in a joint array, or `None` for the gripper.
    pub fn index(&self) -> Option<usize> {
        ARM_IDS.iter().position(|id| id == self)
    }
}

impl std::fmt::Display for ActId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActId::ArmBase => "base",
            ActId::ArmShoulder => "shoulder",
            ActId::ArmElbow => "elbow",
            ActId::ArmWrist => "wrist",
            ActId::ArmGripper => "gripper",
        };
        write!(f, "{}", name)
    }
}

impl JointVector {
    pub fn new(pos_rad: [f64; NUM_ARM_JOINTS], gripper: f64) -> Self {
        Self { pos_rad, gripper }
    }

    /// Get the angle of the given positioning joint. The gripper has no angle and returns `None`.
    pub fn get(&self, id: ActId) -> Option<f64> {
        id.index().map(|i| self.pos_rad[i])
    }

    /// Return a copy of this vector with the given joint replaced.
    pub fn with(&self, id: ActId, value: f64) -> Self {
        let mut out = *self;
        match id.index() {
            Some(i) => out.pos_rad[i] = value,
            None => out.gripper = value,
        }
        out
    }
}

impl From<JointVector> for MechDems {
    fn from(joints: JointVector) -> Self {
        Self {
            pos_rad: joints.pos_rad,
            gripper: joints.gripper,
        }
    }
}

impl MechSensData {
    /// True if every joint rate is exactly zero.
    pub fn is_stationary(&self) -> bool {
        self.speed_rads.iter().all(|s| *s == 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joint_access() {
        let j = JointVector::new([0.1, 0.2, 0.3, 0.4], 1.0);

        assert_eq!(j.get(ActId::ArmElbow), Some(0.3));
        assert_eq!(j.get(ActId::ArmGripper), None);

        let k = j.with(ActId::ArmBase, -1.0).with(ActId::ArmGripper, 0.0);
        assert_eq!(k.pos_rad, [-1.0, 0.2, 0.3, 0.4]);
        assert_eq!(k.gripper, 0.0);
    }

    #[test]
    fn test_stationary() {
        let mut sens = MechSensData::default();
        assert!(sens.is_stationary());

        sens.speed_rads[2] = 1e-12;
        assert!(!sens.is_stationary());
    }
}
