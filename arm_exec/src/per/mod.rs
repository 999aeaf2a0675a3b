//! # Perception module
//!
//! Localises detected objects in the arm's base frame from an aligned colour and depth frame
//! pair.
//!
//! For each detector box:
//!  - Crop the depth image to the box
//!  - Back-project every pixel with a valid depth into the camera frame
//!  - Split the depths into a near and a far cluster, keeping the near one as the object
//!  - Take the centroid of the object, biased deeper towards the grasp point
//!  - Transform the centroid into the base frame

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod cluster;
mod params;

pub use params::PerParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{
    cam::{CamIntrinsics, DepthImage, FramePair},
    det::{BBox, Detection, RawDetection},
};
use log::{debug, warn};
use nalgebra::{Point3, Vector3};

use crate::frame_tf::{FrameTf, FrameTfError, PoseSource};
use cluster::near_cluster_max;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Manages the localisation of detected objects.
#[derive(Debug, Clone)]
pub struct PerMgr {
    pub params: PerParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PerError {
    #[error(
        "The colour image ({colour_w}x{colour_h}) and depth image ({depth_w}x{depth_h}) are not \
        the same size"
    )]
    FrameSizeMismatch {
        colour_w: u32,
        colour_h: u32,
        depth_w: u32,
        depth_h: u32,
    },

    #[error("Could not transform a grasp point into the base frame: {0}")]
    FrameTf(#[from] FrameTfError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PerMgr {
    pub fn new(params: PerParams) -> Self {
        Self { params }
    }

    /// Localise every detection with at least `confidence_threshold` confidence.
    ///
    /// Boxes with no valid depth are skipped, so the result may hold fewer detections than were
    /// given, or none at all.
    pub fn localise<S: PoseSource + ?Sized>(
        &self,
        frames: &FramePair,
        intrinsics: &CamIntrinsics,
        raw_detections: &[RawDetection],
        confidence_threshold: f64,
        frame_tf: &FrameTf,
        pose_src: &S,
    ) -> Result<Vec<Detection>, PerError> {
        if !frames.is_aligned() {
            let (colour_w, colour_h) = frames.colour.dimensions();
            let (depth_w, depth_h) = frames.depth.dimensions();
            return Err(PerError::FrameSizeMismatch {
                colour_w,
                colour_h,
                depth_w,
                depth_h,
            });
        }

        let mut detections = Vec::with_capacity(raw_detections.len());

        for raw in raw_detections {
            if raw.confidence < confidence_threshold {
                debug!(
                    "Ignoring {} with confidence {:.2} (threshold {:.2})",
                    raw.label, raw.confidence, confidence_threshold
                );
                continue;
            }

            let grasp_point = self.grasp_point_cam(&frames.depth, intrinsics, &raw.bbox);
            let grasp_point_cam = match grasp_point {
                Some(p) => p,
                None => {
                    warn!(
                        "No valid depth in the box of {} at {:?}, skipping",
                        raw.label, raw.bbox
                    );
                    continue;
                }
            };

            let grasp_point_m = frame_tf.camera_point_to_base(pose_src, &grasp_point_cam)?;

            debug!(
                "Localised {} ({:.2}) at [{:.3}, {:.3}, {:.3}] m",
                raw.label, raw.confidence, grasp_point_m.x, grasp_point_m.y, grasp_point_m.z
            );

            detections.push(Detection {
                label: raw.label.clone(),
                bbox: raw.bbox,
                confidence: raw.confidence,
                grasp_point_m,
            });
        }

        Ok(detections)
    }

    /// Compute the grasp point of the object in a box, in the camera frame.
    ///
    /// Returns `None` if the box lies outside the image or contains no valid depth.
    pub fn grasp_point_cam(
        &self,
        depth: &DepthImage,
        intrinsics: &CamIntrinsics,
        bbox: &BBox,
    ) -> Option<Point3<f64>> {
        let points = back_project(depth, intrinsics, bbox);

        let zs: Vec<f64> = points.iter().map(|p| p.z).collect();
        let near_max_m = near_cluster_max(&zs)?;

        let mut sum = Vector3::zeros();
        let mut num = 0usize;
        for p in points.iter().filter(|p| p.z <= near_max_m) {
            sum += p.coords;
            num += 1;
        }

        if num == 0 {
            return None;
        }

        let mut centroid = Point3::from(sum / num as f64);
        centroid.z += self.params.z_bias_m;

        Some(centroid)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Back-project the pixels of a box which have a depth measurement into the camera frame.
pub fn back_project(
    depth: &DepthImage,
    intrinsics: &CamIntrinsics,
    bbox: &BBox,
) -> Vec<Point3<f64>> {
    let (u0, v0, u1, v1) = match bbox.pixel_bounds(depth.width(), depth.height()) {
        Some(b) => b,
        None => return Vec::new(),
    };

    let mut points = Vec::with_capacity(((u1 - u0) * (v1 - v0)) as usize);

    for v in v0..v1 {
        for u in u0..u1 {
            let raw = depth.get_pixel(u, v).0[0];
            if raw == 0 {
                continue;
            }

            let z_m = raw as f64 * intrinsics.depth_scale;
            points.push(Point3::new(
                (u as f64 - intrinsics.cx) * z_m / intrinsics.fx,
                (v as f64 - intrinsics.cy) * z_m / intrinsics.fy,
                z_m,
            ));
        }
    }

    points
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::CartesianPose;
    use crate::frame_tf::FrameTfParams;
    use chrono::Utc;
    use image::{ImageBuffer, Luma, RgbImage};
    use nalgebra::Rotation3;

    fn intrinsics() -> CamIntrinsics {
        CamIntrinsics {
            fx: 50.0,
            fy: 50.0,
            cx: 20.0,
            cy: 15.0,
            depth_scale: 0.001,
        }
    }

    /// Background at 800 mm with a 4x4 pixel object at 400 mm, and a patch with no depth.
    fn frames() -> FramePair {
        let depth = ImageBuffer::from_fn(40, 30, |u, v| {
            if (10..14).contains(&u) && (10..14).contains(&v) {
                Luma([400u16])
            } else if u >= 30 && v >= 20 {
                Luma([0u16])
            } else {
                Luma([800u16])
            }
        });

        FramePair {
            timestamp: Utc::now(),
            colour: RgbImage::new(40, 30),
            depth,
        }
    }

    /// Camera frame and base frame coincide.
    fn identity() -> (FrameTf, CartesianPose) {
        let mut params = FrameTfParams::default();
        params.calib_translation_m = [0.0; 3];
        params.height_correction.enabled = false;

        let pose = CartesianPose {
            position_m: Point3::origin(),
            rotation: Rotation3::identity(),
            gripper_yaw_rad: 0.0,
        };

        (FrameTf::new(&params), pose)
    }

    fn raw(label: &str, bbox: BBox, confidence: f64) -> RawDetection {
        RawDetection {
            bbox,
            label: label.into(),
            confidence,
        }
    }

    #[test]
    fn test_back_project() {
        let depth = frames().depth;

        let points = back_project(&depth, &intrinsics(), &BBox::new(20.0, 15.0, 21.0, 16.0));
        assert_eq!(points.len(), 1);
        assert!((points[0] - Point3::new(0.0, 0.0, 0.8)).norm() < 1e-12);

        // Zero depth is excluded
        let points = back_project(&depth, &intrinsics(), &BBox::new(28.0, 20.0, 32.0, 21.0));
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_localise() {
        let per = PerMgr::new(PerParams::default());
        let (tf, pose) = identity();

        let raws = vec![
            raw("cube", BBox::new(8.0, 8.0, 16.0, 16.0), 0.9),
            raw("ghost", BBox::new(30.0, 20.0, 40.0, 30.0), 0.9),
            raw("ball", BBox::new(8.0, 8.0, 16.0, 16.0), 0.3),
        ];

        let dets = per
            .localise(&frames(), &intrinsics(), &raws, 0.5, &tf, &pose)
            .unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "cube");
        assert_eq!(dets[0].confidence, 0.9);

        let expected = Point3::new(-8.5 * 0.4 / 50.0, -3.5 * 0.4 / 50.0, 0.43);
        assert!(
            (dets[0].grasp_point_m - expected).norm() < 1e-9,
            "{} != {}",
            dets[0].grasp_point_m,
            expected
        );
    }

    #[test]
    fn test_empty_box_does_not_stop_others() {
        let per = PerMgr::new(PerParams::default());
        let (tf, pose) = identity();

        // The zero depth box comes first
        let raws = vec![
            raw("ghost", BBox::new(30.0, 20.0, 40.0, 30.0), 0.9),
            raw("cube", BBox::new(8.0, 8.0, 16.0, 16.0), 0.8),
            raw("outside", BBox::new(50.0, 50.0, 60.0, 60.0), 0.8),
        ];

        let dets = per
            .localise(&frames(), &intrinsics(), &raws, 0.5, &tf, &pose)
            .unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "cube");
    }

    #[test]
    fn test_no_detections() {
        let per = PerMgr::new(PerParams::default());
        let (tf, pose) = identity();

        assert!(per
            .localise(&frames(), &intrinsics(), &[], 0.5, &tf, &pose)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_frame_size_mismatch() {
        let per = PerMgr::new(PerParams::default());
        let (tf, pose) = identity();
        let mut frames = frames();
        frames.colour = RgbImage::new(20, 30);

        assert!(matches!(
            per.localise(&frames, &intrinsics(), &[], 0.5, &tf, &pose),
            Err(PerError::FrameSizeMismatch {
                colour_w: 20,
                depth_w: 40,
                ..
            })
        ));
    }
}
