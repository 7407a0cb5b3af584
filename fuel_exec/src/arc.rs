//! # Arc length engine
//!
//! Distances along a sequence of NED points. Only the north and east components are used, so
//! every distance is a ground track distance and altitude changes are ignored.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Planar (north, east) distance between two points.
pub fn pairwise_distance(p1: &Vector3<f64>, p2: &Vector3<f64>) -> f64 {
    (p2.xy() - p1.xy()).norm()
}

/// Total length of the sequence of points.
pub fn cumulative_length(points: &[Vector3<f64>]) -> f64 {
    points
        .windows(2)
        .map(|w| pairwise_distance(&w[0], &w[1]))
        .sum()
}

/// Length of the sequence covering only the first `up_to` points.
///
/// If `up_to` is larger than the number of points only the available points are used, so the
/// result is never more than [`cumulative_length`].
pub fn partial_length(points: &[Vector3<f64>], up_to: usize) -> f64 {
    let num_points = up_to.min(points.len());

    cumulative_length(&points[..num_points])
}
