//! Persistence of scan results

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Serialize;

use super::ScanResult;
use util::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Consumer of finished scans.
pub trait ScanSink {
    /// Store a single record.
    fn store(&mut self, record: FlatScanRecord);

    /// Called once every record of a scan has been stored.
    fn finish(&mut self, _result: &ScanResult) {}

    /// Store every record of a scan then finish it.
    fn store_result(&mut self, result: &ScanResult) {
        for record in result.flat_records() {
            self.store(record);
        }
        self.finish(result);
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A detection and its provenance with no nested structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FlatScanRecord {
    pub image_id: String,
    pub angle_rad: f64,
    pub label: String,
    pub confidence: f64,

    pub bbox_x_min: f64,
    pub bbox_y_min: f64,
    pub bbox_x_max: f64,
    pub bbox_y_max: f64,

    pub grasp_x_m: f64,
    pub grasp_y_m: f64,
    pub grasp_z_m: f64,

    pub base_rad: f64,
    pub shoulder_rad: f64,
    pub elbow_rad: f64,
    pub wrist_rad: f64,
    pub gripper: f64,
}

/// Writes scans into the session directory.
///
/// Records are collected and written together with the full result when the scan finishes.
pub struct SessionSink<'a> {
    session: &'a Session,

    records: Vec<FlatScanRecord>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> SessionSink<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            records: Vec::new(),
        }
    }
}

impl ScanSink for SessionSink<'_> {
    fn store(&mut self, record: FlatScanRecord) {
        self.records.push(record);
    }

    fn finish(&mut self, result: &ScanResult) {
        info!(
            "Saving {} scan records to the session",
            self.records.len()
        );

        self.session
            .save_with_timestamp("scan/scan_records.json", std::mem::take(&mut self.records));
        self.session
            .save_with_timestamp("scan/scan_result.json", result.clone());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scan::ScanRecord;
    use comms_if::eqpt::{
        det::{BBox, Detection},
        mech::JointVector,
    };
    use nalgebra::Point3;

    #[derive(Default)]
    struct VecSink {
        records: Vec<FlatScanRecord>,
        finished: usize,
    }

    impl ScanSink for VecSink {
        fn store(&mut self, record: FlatScanRecord) {
            self.records.push(record);
        }

        fn finish(&mut self, _result: &ScanResult) {
            self.finished += 1;
        }
    }

    fn result() -> ScanResult {
        ScanResult {
            records: vec![ScanRecord {
                image_id: "02_1600000000000".into(),
                angle_rad: -1.25,
                joints: JointVector::new([-1.25, 0.35, 1.05, 0.0], 0.0),
                detection: Detection {
                    label: "cube".into(),
                    bbox: BBox::new(10.0, 20.0, 30.0, 40.0),
                    confidence: 0.8,
                    grasp_point_m: Point3::new(0.1, -0.3, 0.05),
                },
            }],
            num_failed_angles: 2,
        }
    }

    #[test]
    fn test_store_result() {
        let mut sink = VecSink::default();
        sink.store_result(&result());

        assert_eq!(sink.finished, 1);
        assert_eq!(sink.records.len(), 1);

        let r = &sink.records[0];
        assert_eq!(r.image_id, "02_1600000000000");
        assert_eq!(r.label, "cube");
        assert_eq!(r.bbox_x_max, 30.0);
        assert_eq!(r.grasp_y_m, -0.3);
        assert_eq!(r.base_rad, -1.25);
        assert_eq!(r.shoulder_rad, 0.35);
    }

    #[test]
    fn test_flat_record_is_flat() {
        let value = serde_json::to_value(&result().flat_records()[0]).unwrap();

        let obj = value.as_object().unwrap();
        assert!(obj.values().all(|v| !v.is_object() && !v.is_array()));
        assert_eq!(obj["grasp_z_m"], serde_json::json!(0.05));
    }
}
