//! Duplicate suppression
//!
//! The same object is usually seen from more than one stop of a sweep. Two detections are of the
//! same object if they have the same label and their grasp points are strictly closer than the
//! threshold in the XY plane. The earliest detection of each object is kept.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::det::Detection;
use log::debug;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distances within this of the threshold count as on it, so that a pair whose coordinates
/// differ by exactly the threshold in decimal is not merged by rounding.
///
/// Units: meters
const DISTANCE_TOLERANCE_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Remove duplicate detections, keeping the first of each.
///
/// Each item is only compared against the items already kept, so running this on its own output
/// changes nothing.
pub fn suppress_duplicates<T: AsRef<Detection>>(items: Vec<T>, threshold_m: f64) -> Vec<T> {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        let dup = kept
            .iter()
            .any(|k| is_duplicate(k.as_ref(), item.as_ref(), threshold_m));

        if dup {
            debug!(
                "Dropping duplicate {} at [{:.3}, {:.3}]",
                item.as_ref().label,
                item.as_ref().grasp_point_m.x,
                item.as_ref().grasp_point_m.y
            );
        } else {
            kept.push(item);
        }
    }

    kept
}

/// True if both detections have the same label and lie strictly within `threshold_m` of each
/// other in XY, less `DISTANCE_TOLERANCE_M`.
pub fn is_duplicate(a: &Detection, b: &Detection, threshold_m: f64) -> bool {
    if a.label != b.label {
        return false;
    }

    let dx = a.grasp_point_m.x - b.grasp_point_m.x;
    let dy = a.grasp_point_m.y - b.grasp_point_m.y;

    dx.hypot(dy) < threshold_m - DISTANCE_TOLERANCE_M
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::det::BBox;
    use nalgebra::Point3;

    struct Det(Detection);

    impl AsRef<Detection> for Det {
        fn as_ref(&self) -> &Detection {
            &self.0
        }
    }

    fn det(label: &str, x: f64, y: f64, z: f64) -> Det {
        Det(Detection {
            label: label.into(),
            bbox: BBox::new(0.0, 0.0, 1.0, 1.0),
            confidence: 0.9,
            grasp_point_m: Point3::new(x, y, z),
        })
    }

    fn points(items: &[Det]) -> Vec<(String, f64, f64)> {
        items
            .iter()
            .map(|d| (d.0.label.clone(), d.0.grasp_point_m.x, d.0.grasp_point_m.y))
            .collect()
    }

    #[test]
    fn test_suppress() {
        let out = suppress_duplicates(
            vec![
                det("cube", 0.3, 0.0, 0.05),
                det("cube", 0.33, 0.02, 0.2),
                det("cup", 0.31, 0.01, 0.05),
                det("cube", 0.5, 0.0, 0.05),
            ],
            0.1,
        );

        // Height is ignored, labels are kept apart, earliest wins
        assert_eq!(
            points(&out),
            vec![
                (String::from("cube"), 0.3, 0.0),
                (String::from("cup"), 0.31, 0.01),
                (String::from("cube"), 0.5, 0.0)
            ]
        );
    }

    #[test]
    fn test_boundary() {
        // 0.25 and 0.125 are exact in binary so the distance is exactly the threshold
        let a = det("cube", 0.0, 0.0, 0.0);
        let b = det("cube", 0.25, 0.0, 0.0);
        let c = det("cube", 0.0, -0.125, 0.0);
        assert!(!is_duplicate(&a.0, &b.0, 0.25));
        assert!(!is_duplicate(&a.0, &c.0, 0.125));
        assert!(is_duplicate(&a.0, &b.0, 0.2500001));

        let out = suppress_duplicates(vec![a, det("cube", 0.1, 0.0, 0.0)], 0.1);
        assert_eq!(out.len(), 2);

        let out = suppress_duplicates(
            vec![det("cube", 0.0, 0.0, 0.0), det("cube", 0.0999, 0.0, 0.0)],
            0.1,
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_boundary_decimal() {
        // 0.3 - 0.2 rounds to just under 0.1
        let a = det("cube", 0.2, 0.0, 0.0);
        let b = det("cube", 0.3, 0.0, 0.0);
        assert!(!is_duplicate(&a.0, &b.0, 0.1));

        let c = det("cube", 0.1, 0.7, 0.0);
        let d = det("cube", 0.1, 0.6, 0.0);
        assert!(!is_duplicate(&c.0, &d.0, 0.1));

        let out = suppress_duplicates(vec![a, b, det("cube", 0.29, 0.0, 0.0)], 0.1);
        assert_eq!(
            points(&out),
            vec![
                (String::from("cube"), 0.2, 0.0),
                (String::from("cube"), 0.3, 0.0)
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        // A chain where each is within the threshold of the next but the ends are not
        let input = vec![
            det("cube", 0.0, 0.0, 0.0),
            det("cube", 0.08, 0.0, 0.0),
            det("cube", 0.16, 0.0, 0.0),
            det("cube", 0.24, 0.0, 0.0),
            det("ball", 0.0, 0.05, 0.0),
        ];

        let once = suppress_duplicates(input, 0.1);
        let once_points = points(&once);
        let twice = suppress_duplicates(once, 0.1);

        assert_eq!(
            once_points,
            vec![
                (String::from("cube"), 0.0, 0.0),
                (String::from("cube"), 0.16, 0.0),
                (String::from("ball"), 0.0, 0.05)
            ]
        );
        assert_eq!(points(&twice), once_points);
    }
}
