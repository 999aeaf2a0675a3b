//! Safety limit checks for arm commands
//!
//! Every check is a pure predicate on a cartesian target or a joint solution. All of them must
//! pass before any demand is sent to the mechanisms.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::{ActId, JointVector, NUM_ARM_JOINTS};
use nalgebra::Point3;
use serde::Deserialize;

use super::fmt_point;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The no-go volume surrounding the arm's own base and pedestal.
///
/// The volume is a box centred on the base axis, spanning `[-half_width_m, half_width_m]` in x
/// and y and `[0, height_m]` in z.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExclusionZone {
    /// Units: meters
    pub half_width_m: f64,

    /// Units: meters
    pub height_m: f64,
}

/// Allowed range of each positioning joint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct JointLimits {
    /// Lowest allowed angle of each joint, ordered as `ActId::arm_ids()`.
    ///
    /// Units: degrees
    pub min_deg: [f64; NUM_ARM_JOINTS],

    /// Highest allowed angle of each joint, ordered as `ActId::arm_ids()`.
    ///
    /// Units: degrees
    pub max_deg: [f64; NUM_ARM_JOINTS],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A violated safety limit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SafetyError {
    #[error(
        "Target {} lies inside the base exclusion zone (margin {margin_m} m)",
        fmt_point(.position_m)
    )]
    BaseLimitViolation {
        position_m: Point3<f64>,
        margin_m: f64,
    },

    #[error("Target z of {z_m:.3} m is below the ground plane")]
    GroundLimitViolation { z_m: f64 },

    #[error(
        "The {joint} joint at {value_deg:.2} deg is outside its limit of [{min_deg:.1}, \
        {max_deg:.1}] deg"
    )]
    JointLimitViolation {
        joint: ActId,
        value_deg: f64,
        min_deg: f64,
        max_deg: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ExclusionZone {
    fn default() -> Self {
        Self {
            half_width_m: 0.11,
            height_m: 0.9,
        }
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            min_deg: [-170.0, -85.0, -95.0, -160.0],
            max_deg: [170.0, 85.0, 75.0, 160.0],
        }
    }
}

impl ExclusionZone {
    /// True if the point lies inside the zone grown by `margin_m` on every side. Points on the
    /// boundary are inside.
    pub fn contains(&self, pos_m: &Point3<f64>, margin_m: f64) -> bool {
        let xy_lim = self.half_width_m + margin_m;

        pos_m.x >= -xy_lim
            && pos_m.x <= xy_lim
            && pos_m.y >= -xy_lim
            && pos_m.y <= xy_lim
            && pos_m.z >= -margin_m
            && pos_m.z <= self.height_m + margin_m
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Check that a cartesian target is clear of the base exclusion zone.
pub fn validate_base_exclusion(
    pos_m: &Point3<f64>,
    zone: &ExclusionZone,
    margin_m: f64,
) -> Result<(), SafetyError> {
    if zone.contains(pos_m, margin_m) {
        Err(SafetyError::BaseLimitViolation {
            position_m: *pos_m,
            margin_m,
        })
    } else {
        Ok(())
    }
}

/// Check that a cartesian target is not below the ground.
pub fn validate_ground_plane(pos_m: &Point3<f64>) -> Result<(), SafetyError> {
    // Written so that NaN fails
    if pos_m.z >= 0.0 {
        Ok(())
    } else {
        Err(SafetyError::GroundLimitViolation { z_m: pos_m.z })
    }
}

/// Check that every positioning joint is within its limits. The first offending joint is
/// reported.
pub fn validate_joint_limits(
    joints: &JointVector,
    limits: &JointLimits,
) -> Result<(), SafetyError> {
    for (i, act_id) in ActId::arm_ids().iter().enumerate() {
        let value_rad = joints.pos_rad[i];
        let min_rad = limits.min_deg[i].to_radians();
        let max_rad = limits.max_deg[i].to_radians();

        if !(value_rad >= min_rad && value_rad <= max_rad) {
            return Err(SafetyError::JointLimitViolation {
                joint: *act_id,
                value_deg: value_rad.to_degrees(),
                min_deg: limits.min_deg[i],
                max_deg: limits.max_deg[i],
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_base_exclusion() {
        let zone = ExclusionZone::default();

        // Inside for any non-negative margin, including on the boundary
        for margin in [0.0, 0.005, 0.1].iter() {
            for p in [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.05, 0.0, 0.3),
                Point3::new(-0.11, 0.11, 0.9),
                Point3::new(0.1, -0.1, 0.5),
            ]
            .iter()
            {
                assert!(validate_base_exclusion(p, &zone, *margin).is_err());
            }
        }

        // Strictly outside the default margin
        for p in [
            Point3::new(0.3, 0.0, 0.175),
            Point3::new(0.116, 0.0, 0.3),
            Point3::new(0.0, -0.2, 0.1),
            Point3::new(0.0, 0.0, 0.906),
            Point3::new(0.05, 0.05, -0.006),
        ]
        .iter()
        {
            assert!(validate_base_exclusion(p, &zone, 0.005).is_ok());
        }

        // The margin grows the zone
        let p = Point3::new(0.113, 0.0, 0.2);
        assert!(validate_base_exclusion(&p, &zone, 0.0).is_ok());
        assert_eq!(
            validate_base_exclusion(&p, &zone, 0.005),
            Err(SafetyError::BaseLimitViolation {
                position_m: p,
                margin_m: 0.005
            })
        );
    }

    #[test]
    fn test_ground_plane() {
        assert!(validate_ground_plane(&Point3::new(0.3, 0.0, 0.0)).is_ok());
        assert!(validate_ground_plane(&Point3::new(0.3, 0.0, 0.2)).is_ok());
        assert_eq!(
            validate_ground_plane(&Point3::new(0.3, 0.0, -0.01)),
            Err(SafetyError::GroundLimitViolation { z_m: -0.01 })
        );
        assert!(validate_ground_plane(&Point3::new(0.3, 0.0, f64::NAN)).is_err());
    }

    #[test]
    fn test_joint_limits() {
        let limits = JointLimits::default();
        let nominal = JointVector::new(
            [
                160f64.to_radians(),
                -80f64.to_radians(),
                70f64.to_radians(),
                0.0,
            ],
            0.0,
        );
        assert!(validate_joint_limits(&nominal, &limits).is_ok());

        // Exceeding any single joint fails, reporting that joint
        let over = [175.0, -90.0, 80.0, 165.0];
        for (i, act_id) in ActId::arm_ids().iter().enumerate() {
            let j = nominal.with(*act_id, over[i] * std::f64::consts::PI / 180.0);

            match validate_joint_limits(&j, &limits) {
                Err(SafetyError::JointLimitViolation {
                    joint,
                    value_deg,
                    min_deg,
                    max_deg,
                }) => {
                    assert_eq!(joint, *act_id);
                    assert!((value_deg - over[i]).abs() < 1e-9);
                    assert_eq!(min_deg, limits.min_deg[i]);
                    assert_eq!(max_deg, limits.max_deg[i]);
                }
                r => panic!("Expected joint limit violation for {}, got {:?}", act_id, r),
            }
        }

        // The elbow range is asymmetric
        let j = nominal.with(ActId::ArmElbow, -94f64.to_radians());
        assert!(validate_joint_limits(&j, &limits).is_ok());
    }

    #[test]
    fn test_violation_message() {
        let e = SafetyError::JointLimitViolation {
            joint: ActId::ArmShoulder,
            value_deg: 90.0,
            min_deg: -85.0,
            max_deg: 85.0,
        };

        assert_eq!(
            e.to_string(),
            "The shoulder joint at 90.00 deg is outside its limit of [-85.0, 85.0] deg"
        );
    }
}
