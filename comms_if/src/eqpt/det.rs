//! # Object Detector Data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Axis aligned bounding box in image coordinates.
///
/// Units: pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

/// A single box reported by the object detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawDetection {
    pub bbox: BBox,
    pub label: String,
    pub confidence: f64,
}

/// A detected object localised in the arm's base frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub label: String,
    pub bbox: BBox,
    pub confidence: f64,

    /// Point at which the gripper should close to pick up the object.
    ///
    /// Units: meters,
    /// Frame: Arm base
    pub grasp_point_m: Point3<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Clamp the box to an image of the given size, returning the half-open pixel ranges
    /// `(u_start, v_start, u_end, v_end)`, or `None` if nothing of the box lies in the image.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let clamp = |v: f64, max: u32| -> u32 {
            if v.is_nan() || v <= 0.0 {
                0
            } else if v >= max as f64 {
                max
            } else {
                v as u32
            }
        };

        let u0 = clamp(self.x_min.floor(), width);
        let v0 = clamp(self.y_min.floor(), height);
        let u1 = clamp(self.x_max.ceil(), width);
        let v1 = clamp(self.y_max.ceil(), height);

        if u1 > u0 && v1 > v0 {
            Some((u0, v0, u1, v1))
        } else {
            None
        }
    }
}
