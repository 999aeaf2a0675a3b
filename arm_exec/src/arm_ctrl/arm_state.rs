//! Arm state structures

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::mech::JointVector;
use serde::Serialize;

// Internal
use super::CartesianPose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The arm's state as of the last successful motion.
///
/// Only updated once a commanded motion has both reached its target and come to rest.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ArmState {
    /// Joints measured at the end of the last motion, plus the last commanded gripper value.
    pub joints: JointVector,

    /// Gripper pose computed from `joints`, or `None` if no motion has completed yet.
    pub pose: Option<CartesianPose>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Progress of a single motion command.
///
/// ```text
/// Idle -> Validating -> Rejected
///                    -> Commanding -> Converging(Position) -> ArrivalTimeout
///                                                          -> Converging(Stationary) -> StationaryTimeout
///                                                                                    -> Arrived
/// ```
///
/// A mechanisms failure at any point after `Validating` ends the command in `Faulted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MotionState {
    Idle,
    Validating,
    Rejected,
    Commanding,
    Converging(Phase),
    Arrived,
    ArrivalTimeout,
    StationaryTimeout,

    /// The command was abandoned because the mechanisms link failed.
    Faulted,
}

/// Convergence phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Waiting for the gripper to come within the arrival threshold of the target.
    Position,

    /// Waiting for every joint to stop moving.
    Stationary,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for MotionState {
    fn default() -> Self {
        MotionState::Idle
    }
}

impl MotionState {
    /// True if the motion has finished, whether it succeeded or not.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MotionState::Rejected
                | MotionState::Arrived
                | MotionState::ArrivalTimeout
                | MotionState::StationaryTimeout
                | MotionState::Faulted
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_terminal() {
        assert!(!MotionState::default().is_terminal());
        assert!(!MotionState::Converging(Phase::Stationary).is_terminal());
        assert!(MotionState::Rejected.is_terminal());
        assert!(MotionState::StationaryTimeout.is_terminal());
        assert!(MotionState::Faulted.is_terminal());
    }
}
