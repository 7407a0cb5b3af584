//! Active time and progress of a single run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use path_if::history::Observation;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Time the vehicle spent actively running, from timestamp ordered observations.
///
/// Each RUNNING observation is credited the time since the previous observation. When the
/// previous observation was not RUNNING the vehicle has just resumed, and the interval crossing
/// that boundary is debited again so it does not count. Non-RUNNING observations contribute
/// nothing, and the first observation contributes only its offset from the start of the run,
/// which is zero.
///
/// Units: seconds
pub fn active_time_s(observations: &[Observation]) -> f64 {
    let mut total_s = 0.0;

    for pair in observations.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);

        if !curr.state.is_running() {
            continue;
        }

        let delta_s = curr.timestamp_s - prev.timestamp_s;
        total_s += delta_s;

        if !prev.state.is_running() {
            total_s -= delta_s;
        }
    }

    total_s
}

/// Change in progress fraction between the first and last observations.
pub fn net_progress_fraction(observations: &[Observation]) -> f64 {
    match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => last.progress_fraction - first.progress_fraction,
        _ => 0.0,
    }
}

/// Number of waypoints passed between the first and last observations.
///
/// Runs which report going backwards have traversed zero points.
pub fn points_traversed(observations: &[Observation]) -> usize {
    match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => (last.progress_index - first.progress_index).max(0) as usize,
        _ => 0,
    }
}
