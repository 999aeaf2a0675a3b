//! # Camera Equipment Data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use image::{ImageBuffer, Luma, RgbImage};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Raw depth image as produced by the depth sensor. A value of zero means no measurement.
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An aligned colour and depth frame acquired at the same instant.
#[derive(Debug, Clone)]
pub struct FramePair {
    /// UTC timestamp at which the frames were acquired
    pub timestamp: DateTime<Utc>,

    /// The colour image
    pub colour: RgbImage,

    /// The depth image, aligned pixel-for-pixel with `colour`
    pub depth: DepthImage,
}

/// Pinhole intrinsics of the depth-aligned camera.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CamIntrinsics {
    /// Focal length along the image x axis.
    ///
    /// Units: pixels
    pub fx: f64,

    /// Focal length along the image y axis.
    ///
    /// Units: pixels
    pub fy: f64,

    /// Principal point x coordinate.
    ///
    /// Units: pixels
    pub cx: f64,

    /// Principal point y coordinate.
    ///
    /// Units: pixels
    pub cy: f64,

    /// Multiplier converting raw depth values into meters.
    pub depth_scale: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FramePair {
    /// True if the colour and depth images have the same dimensions.
    pub fn is_aligned(&self) -> bool {
        self.colour.dimensions() == self.depth.dimensions()
    }

    /// Identifier for this frame, unique within a session.
    pub fn image_id(&self, index: usize) -> String {
        format!("{:02}_{}", index, self.timestamp.timestamp_millis())
    }
}
