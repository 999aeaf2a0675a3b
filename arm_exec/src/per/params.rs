//! Parameters structure for perception

use serde::Deserialize;

/// Parameters for the object localiser.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PerParams {
    /// Added to the camera frame depth of each foreground centroid. Detector boxes frame the top
    /// surface of an object, which sits above the point the gripper should close on.
    ///
    /// Units: meters
    pub z_bias_m: f64,
}

impl Default for PerParams {
    fn default() -> Self {
        Self { z_bias_m: 0.03 }
    }
}
