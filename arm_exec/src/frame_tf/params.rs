//! Parameters structure for the frame transform

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the frame transform.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrameTfParams {
    /// Rows of the rotation taking camera optical frame vectors into the gripper frame.
    pub calib_rotation: [[f64; 3]; 3],

    /// Position of the camera optical centre in the gripper frame.
    ///
    /// Units: meters
    pub calib_translation_m: [f64; 3],

    /// Linear correction applied to the height of transformed points.
    pub height_correction: HeightCorrection,
}

/// Empirical correction of the height of a transformed point.
///
/// The calibration is most accurate close to the base. The corrected height is a linear function
/// of the Manhattan distance of the point from the base axis, mapping `radial_near_m` to
/// `z_near_m` and `radial_far_m` to `z_far_m`, extrapolating outside that range. These constants
/// are tuned for one physical setup and should be recalibrated for any other.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HeightCorrection {
    pub enabled: bool,

    /// Units: meters
    pub radial_near_m: f64,

    /// Units: meters
    pub radial_far_m: f64,

    /// Units: meters
    pub z_near_m: f64,

    /// Units: meters
    pub z_far_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FrameTfParams {
    fn default() -> Self {
        Self {
            calib_rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            calib_translation_m: [0.0, -0.045, 0.02],
            height_correction: HeightCorrection::default(),
        }
    }
}

impl Default for HeightCorrection {
    fn default() -> Self {
        Self {
            enabled: true,
            radial_near_m: 0.15,
            radial_far_m: 1.6,
            z_near_m: 0.03,
            z_far_m: 0.13,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: FrameTfParams =
            util::params::parse(include_str!("../../../params/frame_tf.toml")).unwrap();

        assert_eq!(params.calib_translation_m, [0.0, -0.045, 0.02]);
        assert!(params.height_correction.enabled);
        assert_eq!(params.height_correction.radial_far_m, 1.6);
    }
}
