//! Main arm executable entry point.
//!
//! Runs a single arm command against the simulated equipment, for example:
//!
//! ```text
//! arm_exec move-to 0.3 0.0 0.175
//! arm_exec scan --confidence 0.6
//! ```
//!
//! Every run creates a new session in `$ARM_SW_ROOT/sessions` holding the log and any saved scan
//! results.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use comms_if::{eqpt::mech::JointVector, tc::arm_ctrl::ArmCmd};
use log::info;
use nalgebra::Point3;
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm_ctrl::{self, ArmCtrl},
    cam_client::{CamClient, CamClientParams},
    frame_tf::{FrameTf, FrameTfParams},
    per::{PerMgr, PerParams},
    scan::{ScanMgr, ScanParams, ScanSink, SessionSink},
    sim_client::{SimCam, SimDetector, SimMech, SimParams},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let cmd = ArmCmd::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    info!("Command: {:?}", cmd);

    // ---- LOAD PARAMETERS ----

    let arm_params: arm_ctrl::Params =
        util::params::load("arm_ctrl.toml").wrap_err("Could not load arm_ctrl params")?;
    let frame_tf_params: FrameTfParams =
        util::params::load("frame_tf.toml").wrap_err("Could not load frame_tf params")?;
    let per_params: PerParams =
        util::params::load("per.toml").wrap_err("Could not load per params")?;
    let scan_params: ScanParams =
        util::params::load("scan.toml").wrap_err("Could not load scan params")?;
    let cam_params: CamClientParams =
        util::params::load("cam_client.toml").wrap_err("Could not load cam_client params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    info!("Parameters loaded");

    // ---- INITIALISE EQUIPMENT ----

    let mech = SimMech::new(&sim_params);
    let sim_state = mech.state();

    let arm = ArmCtrl::new(
        arm_params.clone(),
        Box::new(arm_params.geometry),
        Box::new(mech),
    );
    let mut cam = CamClient::new(
        cam_params,
        Box::new(SimCam::new(&sim_params, sim_state.clone())),
    );
    let mut det = SimDetector::new(&sim_params, sim_state);

    info!("Simulated equipment initialised\n");

    // ---- EXECUTE COMMAND ----

    let result = match cmd {
        ArmCmd::MoveTo {
            x_m,
            y_m,
            z_m,
            yaw_rad,
        } => arm
            .move_to(Point3::new(x_m, y_m, z_m), yaw_rad)
            .wrap_err("Move failed"),
        ArmCmd::MoveJoints {
            base_rad,
            shoulder_rad,
            elbow_rad,
            wrist_rad,
        } => {
            let gripper = arm.arm_state().joints.gripper;
            arm.move_to_joints(JointVector::new(
                [base_rad, shoulder_rad, elbow_rad, wrist_rad],
                gripper,
            ))
            .wrap_err("Joint move failed")
        }
        ArmCmd::Home => arm.move_home().wrap_err("Home move failed"),
        ArmCmd::Open => arm.set_gripper(false).wrap_err("Could not open the gripper"),
        ArmCmd::Close => arm.set_gripper(true).wrap_err("Could not close the gripper"),
        ArmCmd::Scan { confidence } => {
            let scan_mgr = ScanMgr::new(
                scan_params.clone(),
                PerMgr::new(per_params),
                FrameTf::new(&frame_tf_params),
            );
            let confidence = confidence.unwrap_or(scan_params.confidence_threshold);

            scan_mgr
                .run_scan(
                    &arm,
                    &mut cam,
                    &mut det,
                    &scan_params.sweep_angles_rad(),
                    confidence,
                )
                .map(|result| {
                    for d in result.detections() {
                        info!(
                            "Found {} ({:.2}) at [{:.3}, {:.3}, {:.3}] m",
                            d.label,
                            d.confidence,
                            d.grasp_point_m.x,
                            d.grasp_point_m.y,
                            d.grasp_point_m.z
                        );
                    }
                    SessionSink::new(&session).store_result(&result);
                })
                .wrap_err("Scan failed")
        }
    };

    if result.is_ok() {
        info!("Command complete, arm state: {:?}", arm.arm_state());
    }

    session.exit();

    result
}
