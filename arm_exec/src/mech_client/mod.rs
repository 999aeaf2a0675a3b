//! # Mechanisms Client
//!
//! This module defines the link to the arm's mechanisms. The link blocks on every read and write,
//! as the underlying hardware interface does.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::mech::{MechDems, MechSensData};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A link to the arm's joint and gripper actuators.
pub trait MechLink: Send {
    /// Read the measured joint positions and rates.
    fn read_measured_state(&mut self) -> Result<MechSensData, MechClientError>;

    /// Send joint and gripper demands.
    fn write_command(&mut self, dems: &MechDems) -> Result<(), MechClientError>;

    /// Returns true if the link to the hardware is currently valid.
    fn connection_valid(&mut self) -> bool;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MechClientError {
    #[error("The client is not connected to the mechanisms")]
    NotConnected,

    #[error("Could not send demands to the mechanisms: {0}")]
    SendError(String),

    #[error("Could not read the measured state from the mechanisms: {0}")]
    RecvError(String),
}
