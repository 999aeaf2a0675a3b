//! # Localisation Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use arm_lib::{
    arm_ctrl::CartesianPose,
    frame_tf::{FrameTf, FrameTfParams},
    per::{cluster::near_cluster_max, PerMgr, PerParams},
    sim_client::{SimCam, SimDetector, SimMech, SimParams},
};
use arm_lib::{cam_client::CamSource, det_client::Detector};
use nalgebra::{Point3, Rotation3, Vector3};

fn localise_benchmark(c: &mut Criterion) {
    // ---- Build a synthetic 640x480 frame from the simulation ----

    let params = SimParams::default();
    let mech = SimMech::new(&params);
    let mut cam = SimCam::new(&params, mech.state());
    let mut det = SimDetector::new(&params, mech.state());

    let frames = cam.get_frame_pair().unwrap().unwrap();
    let intrinsics = cam.get_intrinsics();
    let raw = det.detect(&frames.colour).unwrap();

    let per = PerMgr::new(PerParams::default());
    let frame_tf = FrameTf::new(&FrameTfParams::default());
    let pose = CartesianPose {
        position_m: Point3::new(0.25, 0.0, 0.25),
        rotation: Rotation3::from_axis_angle(&Vector3::y_axis(), 1.4),
        gripper_yaw_rad: 0.0,
    };

    // A single box covering the whole image
    let full_frame = vec![comms_if::eqpt::det::RawDetection {
        bbox: comms_if::eqpt::det::BBox::new(0.0, 0.0, 640.0, 480.0),
        label: "full".into(),
        confidence: 1.0,
    }];

    c.bench_function("PerMgr::localise", |b| {
        b.iter(|| {
            per.localise(&frames, &intrinsics, &raw, 0.5, &frame_tf, &pose)
                .unwrap()
        })
    });

    c.bench_function("PerMgr::localise::full_frame", |b| {
        b.iter(|| {
            per.localise(&frames, &intrinsics, &full_frame, 0.5, &frame_tf, &pose)
                .unwrap()
        })
    });

    // ---- Clustering alone ----

    let depths: Vec<f64> = frames
        .depth
        .pixels()
        .map(|p| p.0[0] as f64 * intrinsics.depth_scale)
        .collect();

    c.bench_function("near_cluster_max", |b| {
        b.iter(|| near_cluster_max(&depths).unwrap())
    });
}

criterion_group!(benches, localise_benchmark);
criterion_main!(benches);
