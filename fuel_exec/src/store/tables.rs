//! Append-only CSV tables of run summaries and path rates.
//!
//! Both tables are headerless, rows are only ever appended. A table file which does not exist yet
//! is read as an empty table.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::Path as FsPath;

use util::{archive, maths};

use super::StoreError;
use crate::history::{PathRateEntry, RunSummary};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The representative rates of all paths.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    entries: Vec<PathRateEntry>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RateTable {
    pub fn new(entries: Vec<PathRateEntry>) -> Self {
        Self { entries }
    }

    /// Read the rate table at the given path.
    pub fn read<P: AsRef<FsPath>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::new(read_table(path)?))
    }

    /// Append entries to the rate table at the given path.
    pub fn append<P: AsRef<FsPath>>(path: P, entries: &[PathRateEntry]) -> Result<(), StoreError> {
        append_table(path, entries)
    }

    pub fn entries(&self) -> &[PathRateEntry] {
        &self.entries
    }

    /// The rate recorded for the given path.
    ///
    /// The table is append-only, so the most recently appended row for the path is used.
    pub fn rate_for(&self, path_id: u64) -> Option<f64> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.path_id == path_id)
            .map(|e| e.rate_s_per_cm)
    }

    /// Median rate over every row of the table, or `0.0` if the table is empty.
    pub fn global_median(&self) -> f64 {
        let rates: Vec<f64> = self.entries.iter().map(|e| e.rate_s_per_cm).collect();
        maths::median(&rates).unwrap_or(0.0)
    }

    /// The rate for the given path, substituting the global median if the path has no rate or
    /// its rate is the `0.0` "no data" value.
    pub fn rate_or_global_median(&self, path_id: u64) -> f64 {
        match self.rate_for(path_id) {
            Some(r) if r != 0.0 => r,
            _ => self.global_median(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read every run summary in the master table.
pub fn read_master<P: AsRef<FsPath>>(path: P) -> Result<Vec<RunSummary>, StoreError> {
    read_table(path)
}

/// Append run summaries to the master table.
pub fn append_master<P: AsRef<FsPath>>(path: P, summaries: &[RunSummary]) -> Result<(), StoreError> {
    append_table(path, summaries)
}

fn read_table<T, P>(path: P) -> Result<Vec<T>, StoreError>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<FsPath>,
{
    if !path.as_ref().exists() {
        return Ok(Vec::new());
    }

    Ok(archive::read_records(path, false)?)
}

fn append_table<T, P>(path: P, rows: &[T]) -> Result<(), StoreError>
where
    T: serde::Serialize,
    P: AsRef<FsPath>,
{
    let mut arch = archive::Archiver::append_to(path, false)?;

    for row in rows {
        arch.serialise(row)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(path_id: u64, rate_s_per_cm: f64) -> PathRateEntry {
        PathRateEntry {
            path_id,
            rate_s_per_cm,
        }
    }

    #[test]
    fn test_rate_lookup() {
        let table = RateTable::new(vec![
            entry(1, 0.002),
            entry(2, 0.0),
            entry(3, 0.004),
            entry(1, 0.003),
        ]);

        // Latest row wins
        assert_eq!(table.rate_for(1), Some(0.003));
        assert_eq!(table.rate_for(4), None);

        // Median of [0.0, 0.002, 0.003, 0.004]
        assert!((table.global_median() - 0.0025).abs() < 1e-12);

        assert_eq!(table.rate_or_global_median(3), 0.004);
        assert!((table.rate_or_global_median(2) - 0.0025).abs() < 1e-12);
        assert!((table.rate_or_global_median(4) - 0.0025).abs() < 1e-12);

        assert_eq!(RateTable::default().global_median(), 0.0);
    }

    #[test]
    fn test_tables_append() {
        let dir = std::env::temp_dir().join("fuel_lib_tables_test_tables_append");
        let _ = std::fs::remove_dir_all(&dir);
        let master_path = dir.join("master.csv");
        let rates_path = dir.join("paths_info.csv");

        // Missing tables are empty
        assert!(read_master(&master_path).unwrap().is_empty());
        assert!(RateTable::read(&rates_path).unwrap().entries().is_empty());

        let summary = RunSummary {
            path_id: 5,
            active_time_s: 120.0,
            points_traversed: 10,
            distance_traveled_cm: 4000.0,
            total_path_distance_cm: 9000.0,
        };
        append_master(&master_path, &[summary.clone()]).unwrap();
        append_master(&master_path, &[summary.clone()]).unwrap();
        assert_eq!(read_master(&master_path).unwrap(), vec![summary.clone(), summary]);

        RateTable::append(&rates_path, &[entry(5, 0.03), entry(6, 0.0)]).unwrap();
        let table = RateTable::read(&rates_path).unwrap();
        assert_eq!(table.entries(), &[entry(5, 0.03), entry(6, 0.0)]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
