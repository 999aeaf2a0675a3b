//! Arm control module
//!
//! Validates and executes cartesian and joint-space commands on the arm, confirming physical
//! arrival before returning.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arm_state;
mod arrival;
mod kinematics;
mod params;
pub mod safety;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Point3;

// Internal
pub use arm_state::*;
pub use kinematics::*;
pub use params::*;
pub use safety::SafetyError;
pub use state::*;

use crate::mech_client::MechClientError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Motion rejected: {0}")]
    Rejected(#[from] SafetyError),

    #[error("No inverse kinematics solution exists for target {}", fmt_point(.0))]
    NoIkSolution(Point3<f64>),

    #[error(
        "Arm did not reach target {} within {timeout_s} s, last measured position was {} ({} \
        away)",
        fmt_point(.target_m),
        fmt_point(.measured_m),
        fmt_dist(.target_m, .measured_m)
    )]
    ArrivalTimeout {
        measured_m: Point3<f64>,
        target_m: Point3<f64>,
        timeout_s: f64,
    },

    #[error(
        "Arm reached target {} but did not come to rest within {timeout_s} s, last measured \
        joint rates {speed_rads:?} rad/s",
        fmt_point(.target_m)
    )]
    StationaryTimeout {
        speed_rads: [f64; comms_if::eqpt::mech::NUM_ARM_JOINTS],
        target_m: Point3<f64>,
        timeout_s: f64,
    },

    #[error("Mechanisms error: {0}")]
    Mech(#[from] MechClientError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Format a point in millimeter precision for diagnostics.
pub(crate) fn fmt_point(p: &Point3<f64>) -> String {
    format!("[{:.3}, {:.3}, {:.3}] m", p.x, p.y, p.z)
}

/// Format the distance between two points for diagnostics.
pub(crate) fn fmt_dist(a: &Point3<f64>, b: &Point3<f64>) -> String {
    format!("{:.3} m", (a - b).norm())
}
