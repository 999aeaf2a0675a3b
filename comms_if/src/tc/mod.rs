//! # Telecommand module
//!
//! This module provides the operator commands accepted by the arm executable.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;
