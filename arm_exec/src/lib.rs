//! # Arm library.
//!
//! This library holds the arm's perception-to-grasp pipeline so that it can be used by the arm
//! executable, the benchmarks and other crates in the workspace.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control - validates and executes motions, confirming arrival
pub mod arm_ctrl;

/// Camera client - acquires aligned colour and depth frames
pub mod cam_client;

/// Detector client - finds objects in colour images
pub mod det_client;

/// Frame transform - maps camera frame points into the arm base frame
pub mod frame_tf;

/// Mechanisms client - reads the measured joints and sends joint demands
pub mod mech_client;

/// Perception - localises detected objects in the arm base frame
pub mod per;

/// Scan - sweeps the arm to find every object in the workspace
pub mod scan;

/// Simulation client - simulated arm, camera and detector
pub mod sim_client;
