//! # Communications interface crate.
//!
//! Provides the common equipment and command interfaces shared by the arm software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator commands
pub mod tc;

/// Data definitions for equipment (mechanisms, cameras, detector)
pub mod eqpt;
