//! # Batch pipeline
//!
//! Rebuilds the persisted tables from a history dump and the stored paths, and answers estimate
//! queries against them. Each operation reads its inputs in full from the files named in the
//! parameters, so operations can be run separately or together through [`Pipeline::run_batch`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::Path as FsPath;

use log::{info, warn};
use path_if::history as records;

use crate::{
    history::{self, PathRateEntry, SummaryReport},
    params::{FileParams, Params, ParamsError},
    projector::{self, FuelEstimate, ProjectorError},
    store::{self, PathStore, RateTable, StoreError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The estimation pipeline over one set of data files.
#[derive(Debug, Clone)]
pub struct Pipeline {
    params: Params,

    /// File locations resolved against the root.
    files: FileParams,
}

/// Everything produced by a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub summaries: SummaryReport,
    pub rates: Vec<PathRateEntry>,
    pub estimates: Vec<(u64, FuelEstimate)>,

    /// Number of paths which could not be estimated.
    pub num_failed: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("Could not load the history dump: {0}")]
    History(#[from] records::HistoryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Could not estimate path {0}: {1}")]
    Projector(u64, ProjectorError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pipeline {
    /// Create a new pipeline, with the file parameters resolved against `root`.
    ///
    /// Parameters which are out of range are rejected here, before any estimate is made.
    pub fn new<P: AsRef<FsPath>>(params: Params, root: P) -> Result<Self, PipelineError> {
        params.validate()?;
        let files = params.files.resolve(root);

        Ok(Self { params, files })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn files(&self) -> &FileParams {
        &self.files
    }

    /// Load every stored path.
    pub fn load_paths(&self) -> Result<PathStore, PipelineError> {
        Ok(PathStore::load_dir(&self.files.paths_dir)?)
    }

    /// Load the rate table.
    pub fn load_rates(&self) -> Result<RateTable, PipelineError> {
        Ok(RateTable::read(&self.files.rate_table)?)
    }

    /// Summarise every run in the history dump and append the summaries to the master table.
    pub fn build_master_table(&self, paths: &PathStore) -> Result<SummaryReport, PipelineError> {
        let raw_records = records::read_dump(&self.files.history_dump)?;
        info!(
            "Loaded {} run records from {:?}",
            raw_records.len(),
            self.files.history_dump
        );

        let report = history::build_summaries(&raw_records, paths);
        store::append_master(&self.files.master_table, &report.summaries)?;

        Ok(report)
    }

    /// Compute the representative rate of every stored path from the whole master table, and
    /// append the rates to the rate table.
    pub fn build_rate_table(&self, paths: &PathStore) -> Result<Vec<PathRateEntry>, PipelineError> {
        let summaries = store::read_master(&self.files.master_table)?;

        let entries: Vec<PathRateEntry> = paths
            .path_ids()
            .map(|id| history::path_rate(id, &summaries, &self.params.rates))
            .collect();

        RateTable::append(&self.files.rate_table, &entries)?;
        info!(
            "Appended rates for {} paths from {} summaries",
            entries.len(),
            summaries.len()
        );

        Ok(entries)
    }

    /// Estimate the fuel and time needed to finish a path from the given progress index.
    ///
    /// Paths without a rate use the global median rate of the table.
    pub fn estimate_path(
        &self,
        paths: &PathStore,
        rates: &RateTable,
        path_id: u64,
        progress_index: usize,
    ) -> Result<FuelEstimate, PipelineError> {
        let path = paths.get(path_id)?;
        let rate = rates.rate_or_global_median(path_id);

        projector::estimate(&path, progress_index, rate, &self.params.fuel)
            .map_err(|e| PipelineError::Projector(path_id, e))
    }

    /// Estimate every stored path at the given progress index.
    ///
    /// Paths which cannot be estimated are logged and left out, the returned count is the
    /// number of such paths.
    pub fn estimate_all(
        &self,
        paths: &PathStore,
        rates: &RateTable,
        progress_index: usize,
    ) -> (Vec<(u64, FuelEstimate)>, usize) {
        let mut estimates = Vec::with_capacity(paths.len());
        let mut num_failed = 0;

        for path_id in paths.path_ids() {
            match self.estimate_path(paths, rates, path_id, progress_index) {
                Ok(est) => {
                    info!(
                        "Path {}: fuel needed {:.6}, minutes remaining {:.2}",
                        path_id,
                        est.fuel_fraction,
                        est.minutes_remaining()
                    );
                    estimates.push((path_id, est));
                }
                Err(e) => {
                    warn!("{}", e);
                    num_failed += 1;
                }
            }
        }

        (estimates, num_failed)
    }

    /// Rebuild both tables and estimate every stored path at the batch progress index.
    pub fn run_batch(&self) -> Result<BatchReport, PipelineError> {
        let paths = self.load_paths()?;

        let summaries = self.build_master_table(&paths)?;
        let rates = self.build_rate_table(&paths)?;

        let table = self.load_rates()?;
        info!("Global median rate is {} s/cm", table.global_median());

        let (estimates, num_failed) =
            self.estimate_all(&paths, &table, self.params.batch.progress_index);

        Ok(BatchReport {
            summaries,
            rates,
            estimates,
            num_failed,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;
    use path_if::{path::ned_cm_to_geodetic, GeoPoint, Path};
    use std::fs;

    /// A path running north, with a waypoint every 10 m.
    fn straight_path(origin: &GeoPoint, num_points: usize) -> Path {
        let mut path = Path::new_empty();
        for i in 0..num_points {
            let ned_cm = Vector3::new(i as f64 * 1000.0, 0.0, 0.0);
            path.add_point(ned_cm_to_geodetic(&ned_cm, origin), None).unwrap();
        }
        path
    }

    fn run(path_id: u64, duration_s: f64, points: i64) -> String {
        format!(
            r#"{{"pathId": "{}", "rawReportEntries": [
                "[{{'timestamp': 0.0, 'state': 'RUNNING', 'current_point': 0, 'progress': 0.0}}]",
                "[{{'timestamp': {}, 'state': 'RUNNING', 'current_point': {}, 'progress': 0.5}}]"
            ]}}"#,
            path_id, duration_s, points
        )
    }

    #[test]
    fn test_run_batch() {
        let root = std::env::temp_dir().join("fuel_lib_pipeline_test_run_batch");
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("data")).unwrap();

        let origin = GeoPoint::new(40.0, -88.0, 200.0);
        let mut paths = PathStore::new();
        paths.insert_path(1, &straight_path(&origin, 31)).unwrap();
        paths.insert_path(2, &straight_path(&origin, 41)).unwrap();
        paths.insert_path(3, &Path::new_empty()).unwrap();
        paths.save_dir(root.join("data/paths")).unwrap();

        // Path 1 takes 20 s per 1000 cm, path 2 has no runs and 5 is an orphan
        let dump = format!(
            "[{}, {}, {}]",
            run(1, 40.0, 3),
            run(1, 60.0, 4),
            run(5, 10.0, 2)
        );
        fs::write(root.join("data/dump_matching.json"), dump).unwrap();

        let pipeline = Pipeline::new(Params::default(), &root).unwrap();
        let report = pipeline.run_batch().unwrap();

        assert_eq!(report.summaries.summaries.len(), 2);
        assert_eq!(report.summaries.num_orphaned, 1);

        assert_eq!(report.rates.len(), 3);
        assert!((report.rates[0].rate_s_per_cm - 0.02).abs() < 1e-6, "{:?}", report.rates);
        assert_eq!(report.rates[1].rate_s_per_cm, 0.0);

        // Path 3 has no points to estimate from
        assert_eq!(report.num_failed, 1);
        assert_eq!(report.estimates.len(), 2);

        // 110 m is left from point 20 of path 1
        let (id, est) = report.estimates[0];
        assert_eq!(id, 1);
        assert!((est.remaining_distance_cm - 11_000.0).abs() < 0.1, "{:?}", est);
        assert!((est.seconds_remaining - 220.0).abs() < 1e-2, "{:?}", est);

        // Path 2 falls back to the global median, which is zero as most paths have no runs
        let table = pipeline.load_rates().unwrap();
        assert_eq!(table.global_median(), 0.0);
        let (id, est) = report.estimates[1];
        assert_eq!(id, 2);
        assert_eq!(est.seconds_remaining, 0.0);

        // Running again appends rather than replaces
        pipeline.run_batch().unwrap();
        let master = store::read_master(&pipeline.files().master_table).unwrap();
        assert_eq!(master.len(), 4);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = Params::default();
        params.fuel.tank_capacity_gal = 0.0;

        match Pipeline::new(params, "/tmp") {
            Err(PipelineError::Params(ParamsError::TankCapacity(_))) => (),
            r => panic!("Expected invalid params, got {:?}", r.map(|_| ())),
        }
    }
}
