//! # Detector Client
//!
//! Defines the interface to the object detector.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::det::RawDetection;
use image::RgbImage;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An object detector operating on colour images.
pub trait Detector: Send {
    /// Detect objects in the image. Finding nothing is not an error and returns an empty list.
    fn detect(&mut self, colour: &RgbImage) -> Result<Vec<RawDetection>, DetClientError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DetClientError {
    #[error("The detector failed to process the image: {0}")]
    DetectionFailed(String),
}
