//! Reduction of run summaries into a representative rate per path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths;

use super::RunSummary;
use crate::params::RateParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The representative rate of a path, as stored in the rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRateEntry {
    pub path_id: u64,

    /// Time taken to travel one centimeter of the path. Zero if the path has no usable runs.
    ///
    /// Units: seconds/centimeter
    pub rate_s_per_cm: f64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The rate of a single run, if it covered any distance on a path of non-zero length.
pub fn run_rate(summary: &RunSummary) -> Option<f64> {
    if summary.distance_traveled_cm != 0.0 && summary.total_path_distance_cm != 0.0 {
        Some(summary.active_time_s / summary.distance_traveled_cm)
    } else {
        None
    }
}

/// Reduce a set of run rates to a single representative rate.
///
/// Rates outside `[rate_floor, median * outlier_factor]` are discarded and the median of the
/// remainder is returned. An empty set, or one where every rate is discarded, gives `0.0`.
pub fn reduce_rates(rates: &[f64], params: &RateParams) -> f64 {
    let median = match maths::median(rates) {
        Some(m) => m,
        None => return 0.0,
    };

    let upper = median * params.outlier_factor;
    let kept: Vec<f64> = rates
        .iter()
        .copied()
        .filter(|r| *r >= params.rate_floor && *r <= upper)
        .collect();

    maths::median(&kept).unwrap_or(0.0)
}

/// Compute the representative rate of a path from every summary in the master table.
pub fn path_rate(path_id: u64, summaries: &[RunSummary], params: &RateParams) -> PathRateEntry {
    let rates: Vec<f64> = summaries
        .iter()
        .filter(|s| s.path_id == path_id)
        .filter_map(run_rate)
        .collect();

    PathRateEntry {
        path_id,
        rate_s_per_cm: reduce_rates(&rates, params),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn summary(path_id: u64, active_time_s: f64, distance_traveled_cm: f64, total: f64) -> RunSummary {
        RunSummary {
            path_id,
            active_time_s,
            points_traversed: 1,
            distance_traveled_cm,
            total_path_distance_cm: total,
        }
    }

    #[test]
    fn test_outlier_rejected() {
        let params = RateParams::default();

        // The 50.0 rate is more than 5 times the median so is not considered
        let rates = [0.001, 0.002, 0.0021, 0.002, 50.0];
        let rate = reduce_rates(&rates, &params);
        assert_eq!(rate, maths::median(&[0.001, 0.002, 0.0021, 0.002]).unwrap());

        // Here the raw median would be 0.002
        let rates = [0.001, 0.001, 0.002, 50.0, 60.0];
        assert_eq!(reduce_rates(&rates, &params), 0.001);
    }

    #[test]
    fn test_floor_inclusive() {
        let params = RateParams::default();

        assert_eq!(reduce_rates(&[0.0009, 0.0009, 0.0008], &params), 0.0009);
        assert_eq!(reduce_rates(&[0.0001, 0.0002, 0.0003], &params), 0.0);
        assert_eq!(reduce_rates(&[], &params), 0.0);
    }

    #[test]
    fn test_path_rate() {
        let params = RateParams::default();
        let summaries = vec![
            summary(1, 10.0, 5000.0, 9000.0),
            summary(2, 99.0, 10.0, 100.0),
            summary(1, 12.0, 4000.0, 9000.0),
            summary(1, 30.0, 10000.0, 9000.0),
        ];

        // Rates of 0.002, 0.003 and 0.003
        let entry = path_rate(1, &summaries, &params);
        assert_eq!(entry.path_id, 1);
        assert!((entry.rate_s_per_cm - 0.003).abs() < 1e-12);

        assert_eq!(path_rate(3, &summaries, &params).rate_s_per_cm, 0.0);
    }

    #[test]
    fn test_zero_distance_safe() {
        let params = RateParams::default();
        let summaries = vec![
            summary(4, 10.0, 0.0, 0.0),
            summary(4, 12.0, 500.0, 0.0),
            summary(4, 8.0, 0.0, 900.0),
        ];

        assert_eq!(run_rate(&summaries[0]), None);
        let entry = path_rate(4, &summaries, &params);
        assert_eq!(entry.rate_s_per_cm, 0.0);
        assert!(entry.rate_s_per_cm.is_finite());
    }
}
