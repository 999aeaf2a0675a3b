//! One-dimensional two-cluster split
//!
//! Separates a set of depths into a near and a far cluster by finding the split that minimises
//! the total squared distance of every value from its cluster mean. Sorting reduces this to
//! checking each gap between consecutive values, which prefix sums make linear.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use ordered_float::OrderedFloat;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the largest value of the near (smaller) cluster of a two-way split of `values`.
///
/// Every value less than or equal to the result belongs to the near cluster. If all values are
/// equal they form a single near cluster. Returns `None` for an empty or non-finite input.
pub fn near_cluster_max(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().map(|&v| OrderedFloat(v)).collect();
    sorted.sort();

    let n = sorted.len();
    let total: f64 = sorted.iter().map(|v| v.0).sum();
    let total_sq: f64 = sorted.iter().map(|v| v.0 * v.0).sum();

    let mut best: Option<(f64, usize)> = None;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for k in 1..n {
        let prev = sorted[k - 1].0;
        sum += prev;
        sum_sq += prev * prev;

        // Only split between distinct values
        if sorted[k].0 <= prev {
            continue;
        }

        let n_near = k as f64;
        let n_far = (n - k) as f64;
        let cost = (sum_sq - sum * sum / n_near)
            + ((total_sq - sum_sq) - (total - sum) * (total - sum) / n_far);

        match best {
            Some((c, _)) if c <= cost => (),
            _ => best = Some((cost, k)),
        }
    }

    match best {
        Some((_, k)) => Some(sorted[k - 1].0),
        None => Some(sorted[n - 1].0),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bimodal() {
        assert_eq!(near_cluster_max(&[0.81, 0.4, 0.8, 0.41, 0.79, 0.42]), Some(0.42));
        assert_eq!(near_cluster_max(&[1.0, 2.0, 3.0, 10.0, 11.0]), Some(3.0));
    }

    #[test]
    fn test_outlier() {
        // A single far outlier forms its own cluster
        assert_eq!(near_cluster_max(&[0.5, 0.5, 0.52, 0.51, 3.0]), Some(0.52));
    }

    #[test]
    fn test_degenerate() {
        assert_eq!(near_cluster_max(&[]), None);
        assert_eq!(near_cluster_max(&[0.3, f64::NAN]), None);
        assert_eq!(near_cluster_max(&[0.7]), Some(0.7));
        assert_eq!(near_cluster_max(&[0.7, 0.7, 0.7]), Some(0.7));
        assert_eq!(near_cluster_max(&[0.7, 0.9]), Some(0.7));
    }

    #[test]
    fn test_duplicates_kept_together() {
        // Equal values never straddle the split
        assert_eq!(near_cluster_max(&[0.4, 0.4, 0.4, 0.6, 0.6, 0.6]), Some(0.4));
    }
}
