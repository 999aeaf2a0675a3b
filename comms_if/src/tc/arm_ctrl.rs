//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::{clap::AppSettings, StructOpt};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be completed by arm control.
#[derive(Debug, Clone, Serialize, Deserialize, StructOpt)]
pub enum ArmCmd {
    /// Move the gripper to a cartesian position in the arm base frame.
    ///
    /// The joint solution is found by inverse kinematics and checked against all safety limits
    /// before the arm moves.
    #[structopt(name = "move-to", setting = AppSettings::AllowNegativeNumbers)]
    MoveTo {
        /// Target x position in meters.
        x_m: f64,

        /// Target y position in meters.
        y_m: f64,

        /// Target z position in meters.
        z_m: f64,

        /// Gripper yaw in radians, applied to the wrist joint.
        #[structopt(long, default_value = "0")]
        yaw_rad: f64,
    },

    /// Move each joint to the given angle.
    #[structopt(name = "move-joints", setting = AppSettings::AllowNegativeNumbers)]
    MoveJoints {
        /// Angle of the base in radians.
        base_rad: f64,

        /// Angle of the shoulder in radians.
        shoulder_rad: f64,

        /// Angle of the elbow in radians.
        elbow_rad: f64,

        /// Angle of the wrist in radians.
        wrist_rad: f64,
    },

    /// Move all joints to zero.
    #[structopt(name = "home")]
    Home,

    /// Open the gripper.
    #[structopt(name = "open")]
    Open,

    /// Close the gripper.
    #[structopt(name = "close")]
    Close,

    /// Sweep the arm around its base, detecting and localising objects.
    #[structopt(name = "scan")]
    Scan {
        /// Minimum detector confidence for a box to be localised. If not given the value from the
        /// scan parameters is used.
        #[structopt(long)]
        confidence: Option<f64>,
    },
}
