//! Fuel estimation executable entry point.
//!
//! # Commands
//!
//!     - `summarise`: summarise the history dump into the master table
//!     - `rates`: compute the rate of every stored path into the rate table
//!     - `estimate <path_id> <index>`: estimate the fuel and time to finish a path
//!     - `batch`: all of the above, estimating every stored path at the batch progress index
//!
//! Every command runs in a new session, which holds the log file and an archive of the
//! estimates that were made.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use fuel_lib::{params::Params, pipeline::Pipeline, projector::FuelEstimate};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the parameter file within the `params` directory of the root.
const PARAMS_FILE: &str = "fuel_est.toml";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "fuel_exec", about = "Estimate the fuel needed to finish a path")]
struct Opt {
    /// Root directory holding the params and data, overrides `FUEL_EST_ROOT`.
    #[structopt(long, parse(from_os_str))]
    root: Option<PathBuf>,

    /// Parameter file to use instead of the one in the root.
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Include debug messages in the log, repeat to also include every skipped report entry.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, StructOpt)]
enum Cmd {
    /// Summarise the history dump into the master table.
    #[structopt(name = "summarise")]
    Summarise,

    /// Compute the representative rate of every stored path.
    #[structopt(name = "rates")]
    Rates,

    /// Estimate the fuel and time needed to finish a path.
    #[structopt(name = "estimate")]
    Estimate {
        /// Id of the path being followed.
        path_id: u64,

        /// Index of the waypoint the vehicle is heading for.
        index: usize,
    },

    /// Rebuild both tables and estimate every stored path.
    #[structopt(name = "batch")]
    Batch,
}

/// An estimate as recorded in the session archive.
#[derive(Debug, Serialize)]
struct ArchivedEstimate {
    path_id: u64,
    progress_index: usize,
    distance_traveled_cm: f64,
    total_distance_cm: f64,
    remaining_distance_cm: f64,
    seconds_remaining: f64,
    fuel_fraction: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = match opt.root {
        Some(ref r) => Session::new_in(r, "fuel_exec", "sessions"),
        None => Session::new("fuel_exec", "sessions"),
    }
    .wrap_err("Failed to create the session")?;
    let root = session.sw_root.clone();

    let level = match opt.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    logger_init(level, &session).wrap_err("Failed to initialise logging")?;

    info!("Fuel Estimation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: Params = match (&opt.params, &opt.root) {
        (Some(p), _) => util::params::load_file(p),
        (None, Some(r)) => util::params::load_file(r.join("params").join(PARAMS_FILE)),
        (None, None) => util::params::load(PARAMS_FILE),
    }
    .wrap_err("Could not load the estimation params")?;

    info!("Exec parameters loaded");

    let pipeline = Pipeline::new(params, &root).wrap_err("Could not set up the pipeline")?;

    // ---- RUN COMMAND ----

    match opt.cmd {
        Cmd::Summarise => {
            let paths = pipeline.load_paths().wrap_err("Could not load the paths")?;
            pipeline
                .build_master_table(&paths)
                .wrap_err("Could not build the master table")?;
        }
        Cmd::Rates => {
            let paths = pipeline.load_paths().wrap_err("Could not load the paths")?;
            pipeline
                .build_rate_table(&paths)
                .wrap_err("Could not build the rate table")?;
        }
        Cmd::Estimate { path_id, index } => {
            let paths = pipeline.load_paths().wrap_err("Could not load the paths")?;
            let rates = pipeline.load_rates().wrap_err("Could not load the rate table")?;

            let est = pipeline
                .estimate_path(&paths, &rates, path_id, index)
                .wrap_err_with(|| format!("Could not estimate path {}", path_id))?;

            archive_estimates(&session, &[(path_id, est)], index)?;

            println!("({}, {})", est.fuel_fraction, est.minutes_remaining());
        }
        Cmd::Batch => {
            let report = pipeline.run_batch().wrap_err("Batch run failed")?;

            archive_estimates(
                &session,
                &report.estimates,
                pipeline.params().batch.progress_index,
            )?;

            for (path_id, est) in report.estimates.iter() {
                println!(
                    "{}: ({}, {})",
                    path_id,
                    est.fuel_fraction,
                    est.minutes_remaining()
                );
            }

            info!(
                "Batch complete, {} paths estimated and {} failed",
                report.estimates.len(),
                report.num_failed
            );
        }
    }

    Ok(())
}

/// Record estimates in the session archive.
fn archive_estimates(
    session: &Session,
    estimates: &[(u64, FuelEstimate)],
    progress_index: usize,
) -> Result<(), Report> {
    let mut arch = Archiver::from_path(session, "estimates.csv")
        .wrap_err("Could not create the estimate archive")?;
    info!("Archiving {} estimate(s) to {:?}", estimates.len(), arch.path());

    for (path_id, est) in estimates.iter() {
        arch.serialise(ArchivedEstimate {
            path_id: *path_id,
            progress_index,
            distance_traveled_cm: est.distance_traveled_cm,
            total_distance_cm: est.total_distance_cm,
            remaining_distance_cm: est.remaining_distance_cm,
            seconds_remaining: est.seconds_remaining,
            fuel_fraction: est.fuel_fraction,
        })
        .wrap_err("Could not archive an estimate")?;
    }

    Ok(())
}
