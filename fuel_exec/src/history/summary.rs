//! Summaries of individual historical runs.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::{btree_map::Entry, BTreeMap};

use path_if::{history::HistoricalRunRecord, NedPath};
use serde::{Deserialize, Serialize};

use super::{active_time, HistoryError};
use crate::{arc, store::PathStore};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The distance and time of one accepted run, as stored in the master table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub path_id: u64,

    /// Units: seconds
    pub active_time_s: f64,

    /// Number of waypoints passed during the run.
    pub points_traversed: usize,

    /// Distance covered by the traversed waypoints.
    ///
    /// Units: centimeters
    pub distance_traveled_cm: f64,

    /// Length of the whole path.
    ///
    /// Units: centimeters
    pub total_path_distance_cm: f64,
}

/// Stored paths projected into NED on first use.
///
/// Each path is decoded and projected once however many runs were made on it. Paths which fail
/// to load are not remembered, so their error is reported for every run.
#[derive(Debug)]
pub struct ProjectedPaths<'a> {
    store: &'a PathStore,
    projected: BTreeMap<u64, NedPath>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What became of a run record.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run was accepted and summarised.
    Accepted(RunSummary),

    /// No observations could be parsed for the run.
    NoObservations,

    /// The run's progress fraction did not change.
    NoProgress,

    /// The run never accumulated any active time.
    NoActiveTime,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> ProjectedPaths<'a> {
    pub fn new(store: &'a PathStore) -> Self {
        Self {
            store,
            projected: BTreeMap::new(),
        }
    }

    /// The projection of the given path, with the first waypoint as the origin.
    pub fn get(&mut self, path_id: u64) -> Result<&NedPath, HistoryError> {
        match self.projected.entry(path_id) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let ned = self
                    .store
                    .get(path_id)?
                    .to_ned_from_first()
                    .ok_or(HistoryError::NoGeoPoints(path_id))?;
                Ok(e.insert(ned))
            }
        }
    }

    /// Number of paths projected so far.
    pub fn num_projected(&self) -> usize {
        self.projected.len()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Summarise a run against the stored paths.
///
/// Degenerate runs are reported through [`RunOutcome`] before the path is looked up, so only
/// accepted runs need their path to exist.
pub fn summarise_run(
    record: &HistoricalRunRecord,
    paths: &mut ProjectedPaths,
) -> Result<RunOutcome, HistoryError> {
    let observations = &record.observations;

    if observations.is_empty() {
        return Ok(RunOutcome::NoObservations);
    }

    if active_time::net_progress_fraction(observations) == 0.0 {
        return Ok(RunOutcome::NoProgress);
    }

    let active_time_s = active_time::active_time_s(observations);
    if active_time_s <= 0.0 {
        return Ok(RunOutcome::NoActiveTime);
    }

    let ned = paths.get(record.path_id)?;

    let points_traversed = active_time::points_traversed(observations);

    Ok(RunOutcome::Accepted(RunSummary {
        path_id: record.path_id,
        active_time_s,
        points_traversed,
        distance_traveled_cm: arc::partial_length(&ned.points_cm, points_traversed),
        total_path_distance_cm: arc::cumulative_length(&ned.points_cm),
    }))
}
