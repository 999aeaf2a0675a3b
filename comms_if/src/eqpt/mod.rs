//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with the arm's equipment: the
//! mechanisms (joints and gripper), the RGB-D camera and the object detector.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod det;
pub mod mech;
