//! # Camera Client
//!
//! The camera client acquires aligned colour and depth frames from the camera, waiting a bounded
//! time for a frame to become available.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::thread;
use std::time::{Duration, Instant};

use comms_if::eqpt::cam::{CamIntrinsics, FramePair};
use log::{debug, warn};
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of aligned colour and depth frames.
pub trait CamSource: Send {
    /// Get the latest frame pair, or `None` if no new frame is ready yet.
    fn get_frame_pair(&mut self) -> Result<Option<FramePair>, CamClientError>;

    /// Get the intrinsics of the depth-aligned camera.
    fn get_intrinsics(&self) -> CamIntrinsics;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The camera client
pub struct CamClient {
    params: CamClientParams,

    source: Box<dyn CamSource>,
}

/// Parameters for the camera client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CamClientParams {
    /// Maximum time to wait for a frame pair.
    ///
    /// Units: seconds
    pub acq_timeout_s: f64,

    /// Time between attempts to get a frame pair.
    ///
    /// Units: seconds
    pub retry_period_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CamClientError {
    #[error("No frame was received from the camera within {0} s")]
    Timeout(f64),

    #[error("The camera returned an error: {0}")]
    SourceError(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CamClientParams {
    fn default() -> Self {
        Self {
            acq_timeout_s: 1.0,
            retry_period_s: 0.01,
        }
    }
}

impl CamClient {
    /// Create a new instance of the camera client
    pub fn new(params: CamClientParams, source: Box<dyn CamSource>) -> Self {
        Self { params, source }
    }

    /// Acquire a frame pair, retrying until the acquisition timeout.
    pub fn acquire(&mut self) -> Result<FramePair, CamClientError> {
        let timeout = Duration::from_secs_f64(self.params.acq_timeout_s.max(0.0));
        let retry = Duration::from_secs_f64(self.params.retry_period_s.max(0.0));
        let start = Instant::now();

        loop {
            if let Some(frames) = self.source.get_frame_pair()? {
                if !frames.is_aligned() {
                    warn!(
                        "Acquired colour and depth frames differ in size ({:?} vs {:?})",
                        frames.colour.dimensions(),
                        frames.depth.dimensions()
                    );
                }

                debug!(
                    "Frame pair acquired after {:.3} s",
                    start.elapsed().as_secs_f64()
                );
                return Ok(frames);
            }

            if start.elapsed() >= timeout {
                return Err(CamClientError::Timeout(self.params.acq_timeout_s));
            }

            thread::sleep(retry);
        }
    }

    /// Get the intrinsics of the camera.
    pub fn intrinsics(&self) -> CamIntrinsics {
        self.source.get_intrinsics()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use image::{ImageBuffer, RgbImage};

    /// Returns nothing for a fixed number of attempts then a blank frame.
    struct SlowCam {
        attempts_before_frame: usize,
        attempts: usize,
    }

    impl CamSource for SlowCam {
        fn get_frame_pair(&mut self) -> Result<Option<FramePair>, CamClientError> {
            self.attempts += 1;
            if self.attempts > self.attempts_before_frame {
                Ok(Some(FramePair {
                    timestamp: Utc::now(),
                    colour: RgbImage::new(4, 3),
                    depth: ImageBuffer::new(4, 3),
                }))
            } else {
                Ok(None)
            }
        }

        fn get_intrinsics(&self) -> CamIntrinsics {
            CamIntrinsics {
                fx: 1.0,
                fy: 1.0,
                cx: 2.0,
                cy: 1.5,
                depth_scale: 0.001,
            }
        }
    }

    fn params() -> CamClientParams {
        CamClientParams {
            acq_timeout_s: 0.2,
            retry_period_s: 0.001,
        }
    }

    #[test]
    fn test_acquire_after_retries() {
        let mut client = CamClient::new(
            params(),
            Box::new(SlowCam {
                attempts_before_frame: 3,
                attempts: 0,
            }),
        );

        let frames = client.acquire().unwrap();
        assert_eq!(frames.depth.dimensions(), (4, 3));
        assert_eq!(client.intrinsics().cx, 2.0);
    }

    #[test]
    fn test_acquire_timeout() {
        let mut client = CamClient::new(
            params(),
            Box::new(SlowCam {
                attempts_before_frame: usize::MAX,
                attempts: 0,
            }),
        );

        assert!(matches!(client.acquire(), Err(CamClientError::Timeout(_))));
    }
}
