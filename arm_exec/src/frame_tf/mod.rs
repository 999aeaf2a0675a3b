//! # Frame transform
//!
//! Maps points between the camera optical frame and the arm base frame. The camera is mounted on
//! the gripper, so the transform is the composition of the fixed hand-eye calibration
//! (camera to gripper) with the live gripper pose (gripper to base).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::arm_ctrl::{ArmCtrl, ArmCtrlError, CartesianPose};
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Anything that can report the current gripper pose in the base frame.
pub trait PoseSource {
    fn gripper_pose(&self) -> Result<CartesianPose, ArmCtrlError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed transform from the camera optical frame into the gripper frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationTransform {
    pub rotation: Matrix3<f64>,

    /// Units: meters,
    /// Frame: Gripper
    pub translation_m: Vector3<f64>,
}

/// Camera to base frame transform.
#[derive(Debug, Clone)]
pub struct FrameTf {
    calib: CalibrationTransform,

    height_correction: HeightCorrection,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FrameTfError {
    #[error("Could not get the current gripper pose: {0}")]
    PoseUnavailable(ArmCtrlError),

    #[error("The camera to base transform is not invertible")]
    SingularTransform,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseSource for ArmCtrl {
    fn gripper_pose(&self) -> Result<CartesianPose, ArmCtrlError> {
        ArmCtrl::gripper_pose(self)
    }
}

impl PoseSource for CartesianPose {
    fn gripper_pose(&self) -> Result<CartesianPose, ArmCtrlError> {
        Ok(*self)
    }
}

impl CalibrationTransform {
    /// Homogeneous matrix of the transform.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        homogeneous(&self.rotation, &self.translation_m)
    }
}

impl From<&FrameTfParams> for CalibrationTransform {
    fn from(params: &FrameTfParams) -> Self {
        let r = &params.calib_rotation;
        let t = &params.calib_translation_m;

        Self {
            rotation: Matrix3::new(
                r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
            ),
            translation_m: Vector3::new(t[0], t[1], t[2]),
        }
    }
}

impl FrameTf {
    pub fn new(params: &FrameTfParams) -> Self {
        Self {
            calib: CalibrationTransform::from(params),
            height_correction: params.height_correction,
        }
    }

    /// Transform a camera frame point into the base frame using the current gripper pose.
    ///
    /// Fails with `PoseUnavailable` if the pose cannot be read.
    pub fn camera_point_to_base<S: PoseSource + ?Sized>(
        &self,
        pose_src: &S,
        point_m: &Point3<f64>,
    ) -> Result<Point3<f64>, FrameTfError> {
        let pose = pose_src
            .gripper_pose()
            .map_err(FrameTfError::PoseUnavailable)?;

        Ok(self.camera_point_to_base_at(&pose, point_m))
    }

    /// Transform a camera frame point into the base frame with the gripper at `pose`.
    ///
    /// If height correction is enabled the resulting z is replaced, so the result cannot be
    /// mapped back with [`FrameTf::base_point_to_camera`].
    pub fn camera_point_to_base_at(
        &self,
        pose: &CartesianPose,
        point_m: &Point3<f64>,
    ) -> Point3<f64> {
        let base_m = self.camera_to_base(pose) * point_m.to_homogeneous();
        let mut out = Point3::new(base_m.x, base_m.y, base_m.z);

        if self.height_correction.enabled {
            out.z = self.corrected_height(&out);
            trace!("Height corrected from {:.4} m to {:.4} m", base_m.z, out.z);
        }

        out
    }

    /// Transform a base frame point into the camera frame with the gripper at `pose`.
    ///
    /// This is the inverse of the uncorrected transform.
    pub fn base_point_to_camera(
        &self,
        pose: &CartesianPose,
        point_m: &Point3<f64>,
    ) -> Result<Point3<f64>, FrameTfError> {
        let inv = self
            .camera_to_base(pose)
            .try_inverse()
            .ok_or(FrameTfError::SingularTransform)?;
        let cam_m = inv * point_m.to_homogeneous();

        Ok(Point3::new(cam_m.x, cam_m.y, cam_m.z))
    }

    /// Height of a base frame point given by the correction.
    pub fn corrected_height(&self, point_m: &Point3<f64>) -> f64 {
        let hc = &self.height_correction;
        lin_map(
            (hc.radial_near_m, hc.radial_far_m),
            (hc.z_near_m, hc.z_far_m),
            point_m.x.abs() + point_m.y.abs(),
        )
    }

    /// Base from gripper from camera.
    fn camera_to_base(&self, pose: &CartesianPose) -> Matrix4<f64> {
        let gripper_to_base = homogeneous(pose.rotation.matrix(), &pose.position_m.coords);

        gripper_to_base * self.calib.to_homogeneous()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

#[rustfmt::skip]
fn homogeneous(r: &Matrix3<f64>, t: &Vector3<f64>) -> Matrix4<f64> {
    Matrix4::new(
        r[(0, 0)], r[(0, 1)], r[(0, 2)], t.x,
        r[(1, 0)], r[(1, 1)], r[(1, 2)], t.y,
        r[(2, 0)], r[(2, 1)], r[(2, 2)], t.z,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mech_client::MechClientError;
    use nalgebra::Rotation3;

    struct DeadArm;

    impl PoseSource for DeadArm {
        fn gripper_pose(&self) -> Result<CartesianPose, ArmCtrlError> {
            Err(MechClientError::NotConnected.into())
        }
    }

    fn pose() -> CartesianPose {
        CartesianPose {
            position_m: Point3::new(0.3, 0.1, 0.25),
            rotation: Rotation3::from_euler_angles(0.1, 0.7, -0.4),
            gripper_yaw_rad: -0.4,
        }
    }

    fn uncorrected() -> FrameTf {
        let mut params = FrameTfParams::default();
        params.height_correction.enabled = false;
        params.calib_rotation = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        FrameTf::new(&params)
    }

    #[test]
    fn test_round_trip() {
        let tf = uncorrected();
        let pose = pose();

        for p in &[
            Point3::new(0.4, -0.2, 0.05),
            Point3::new(-0.3, 0.6, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ] {
            let cam = tf.base_point_to_camera(&pose, p).unwrap();
            let base = tf.camera_point_to_base(&pose, &cam).unwrap();
            assert!((base - p).norm() < 1e-9, "{} != {}", base, p);
        }
    }

    #[test]
    fn test_composition_order() {
        let tf = uncorrected();
        let pose = CartesianPose {
            position_m: Point3::new(0.2, 0.0, 0.3),
            rotation: Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
            gripper_yaw_rad: 0.0,
        };

        // Camera origin sits at the calibration translation in the gripper frame, which is then
        // rotated by the gripper pose.
        let base = tf.camera_point_to_base_at(&pose, &Point3::origin());
        assert!((base - Point3::new(0.245, 0.0, 0.32)).norm() < 1e-9, "{}", base);

        // Camera x maps to gripper y maps to base -x
        let base = tf.camera_point_to_base_at(&pose, &Point3::new(0.1, 0.0, 0.0));
        assert!((base - Point3::new(0.145, 0.0, 0.32)).norm() < 1e-9, "{}", base);
    }

    #[test]
    fn test_height_correction() {
        let tf = FrameTf::new(&FrameTfParams::default());

        assert!((tf.corrected_height(&Point3::new(0.15, 0.0, 0.4)) - 0.03).abs() < 1e-12);
        assert!((tf.corrected_height(&Point3::new(-1.0, 0.6, 0.0)) - 0.13).abs() < 1e-12);
        assert!((tf.corrected_height(&Point3::new(0.5, -0.375, 0.0)) - 0.08).abs() < 1e-12);

        // The transformed z is replaced, x and y are untouched.
        let pose = pose();
        let corrected = tf.camera_point_to_base_at(&pose, &Point3::new(0.01, 0.02, 0.3));
        let mut params = FrameTfParams::default();
        params.height_correction.enabled = false;
        let raw =
            FrameTf::new(&params).camera_point_to_base_at(&pose, &Point3::new(0.01, 0.02, 0.3));

        assert_eq!(corrected.x, raw.x);
        assert_eq!(corrected.y, raw.y);
        assert_eq!(corrected.z, tf.corrected_height(&raw));
    }

    #[test]
    fn test_pose_unavailable() {
        let tf = FrameTf::new(&FrameTfParams::default());

        assert!(matches!(
            tf.camera_point_to_base(&DeadArm, &Point3::new(0.0, 0.0, 0.5)),
            Err(FrameTfError::PoseUnavailable(ArmCtrlError::Mech(
                MechClientError::NotConnected
            )))
        ));
    }
}
