//! Projection of the time and fuel needed to finish a path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use path_if::Path;
use serde::Serialize;
use util::time::SECONDS_PER_HOUR;

use crate::{arc, params::FuelParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// What remains of a path from the vehicle's current progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelEstimate {
    /// Units: centimeters
    pub distance_traveled_cm: f64,

    /// Units: centimeters
    pub total_distance_cm: f64,

    /// Units: centimeters
    pub remaining_distance_cm: f64,

    /// Units: seconds
    pub seconds_remaining: f64,

    /// Fraction of a full tank needed to finish the path.
    pub fuel_fraction: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectorError {
    #[error("The path has no waypoints with a location")]
    NoGeoPoints,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FuelEstimate {
    pub fn minutes_remaining(&self) -> f64 {
        self.seconds_remaining / 60.0
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Estimate the fuel and time needed to finish `path` from `progress_index`.
///
/// `rate_s_per_cm` is used as given. A rate of `0.0` gives a zero estimate, so callers holding
/// the "no data" rate must substitute a fallback first.
pub fn estimate(
    path: &Path,
    progress_index: usize,
    rate_s_per_cm: f64,
    params: &FuelParams,
) -> Result<FuelEstimate, ProjectorError> {
    let ned = path.to_ned_from_first().ok_or(ProjectorError::NoGeoPoints)?;

    Ok(project(
        arc::cumulative_length(&ned.points_cm),
        arc::partial_length(&ned.points_cm, progress_index),
        rate_s_per_cm,
        params,
    ))
}

/// Project the remaining time and fuel from path distances in centimeters.
pub fn project(
    total_distance_cm: f64,
    distance_traveled_cm: f64,
    rate_s_per_cm: f64,
    params: &FuelParams,
) -> FuelEstimate {
    let mut remaining_distance_cm = total_distance_cm - distance_traveled_cm;
    if params.clamp_remaining {
        remaining_distance_cm = remaining_distance_cm.max(0.0);
    }

    let seconds_remaining = remaining_distance_cm * rate_s_per_cm;
    let gallons = params.gallons_per_hour() * seconds_remaining / SECONDS_PER_HOUR;

    FuelEstimate {
        distance_traveled_cm,
        total_distance_cm,
        remaining_distance_cm,
        seconds_remaining,
        fuel_fraction: gallons / params.tank_capacity_gal,
    }
}
