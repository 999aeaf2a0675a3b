//! Parameters structure for the scan manager

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for scanning the workspace.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Base angles to stop at, in the order they are visited.
    ///
    /// Units: degrees
    pub sweep_angles_deg: Vec<f64>,

    /// Minimum detector confidence for a detection to be localised.
    pub confidence_threshold: f64,

    /// Detections with the same label closer than this in the XY plane are the same object.
    ///
    /// Units: meters
    pub duplicate_threshold_m: f64,

    /// Gripper position from which the sweep starts. Only the base joint moves during the sweep.
    ///
    /// Units: meters,
    /// Frame: Arm base
    pub scan_ready_position_m: [f64; 3],

    /// Units: radians
    pub scan_ready_yaw_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            sweep_angles_deg: (-4..=4).map(|i| i as f64 * 40.0).collect(),
            confidence_threshold: 0.5,
            duplicate_threshold_m: 0.1,
            scan_ready_position_m: [0.25, 0.0, 0.25],
            scan_ready_yaw_rad: 0.0,
        }
    }
}

impl ScanParams {
    pub fn sweep_angles_rad(&self) -> Vec<f64> {
        self.sweep_angles_deg.iter().map(|a| a.to_radians()).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let params = ScanParams::default();

        assert_eq!(
            params.sweep_angles_deg,
            vec![-160.0, -120.0, -80.0, -40.0, 0.0, 40.0, 80.0, 120.0, 160.0]
        );
    }
}
