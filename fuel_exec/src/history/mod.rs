//! # Historical rate estimation
//!
//! Turns the raw run records of a telemetry dump into per-run summaries, and summaries into a
//! representative rate for each path.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod active_time;
mod rates;
mod summary;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use path_if::history::{self as records, RawRunRecord};

use crate::store::{PathStore, StoreError};

pub use rates::*;
pub use summary::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The accepted summaries of a dump along with counts of the records which were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryReport {
    pub summaries: Vec<RunSummary>,

    /// Runs with no observations, no progress, or no active time.
    pub num_degenerate: usize,

    /// Runs on a path which is not in the path store.
    pub num_orphaned: usize,

    /// Runs with an invalid path id, or on a path which could not be used.
    pub num_invalid: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Record(#[from] records::HistoryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Path {0} has no waypoints with a location")]
    NoGeoPoints(u64),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Summarise every run in a dump.
///
/// A record which cannot be summarised is logged and counted, and never prevents the remaining
/// records from being summarised.
pub fn build_summaries(raw_records: &[RawRunRecord], paths: &PathStore) -> SummaryReport {
    let mut report = SummaryReport::default();
    let mut projected = ProjectedPaths::new(paths);

    for (i, raw) in raw_records.iter().enumerate() {
        let record = match raw.parse() {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping run record {}: {}", i, e);
                report.num_invalid += 1;
                continue;
            }
        };

        match summarise_run(&record, &mut projected) {
            Ok(RunOutcome::Accepted(s)) => report.summaries.push(s),
            Ok(outcome) => {
                debug!("Dropping run {} on path {}: {:?}", i, record.path_id, outcome);
                report.num_degenerate += 1;
            }
            Err(HistoryError::Store(StoreError::MissingPath(id))) => {
                warn!("Run {} is on path {} which is not in the path store", i, id);
                report.num_orphaned += 1;
            }
            Err(e) => {
                warn!("Skipping run {} on path {}: {}", i, record.path_id, e);
                report.num_invalid += 1;
            }
        }
    }

    info!(
        "Summarised {} of {} runs ({} degenerate, {} orphaned, {} invalid)",
        report.summaries.len(),
        raw_records.len(),
        report.num_degenerate,
        report.num_orphaned,
        report.num_invalid
    );

    report
}
