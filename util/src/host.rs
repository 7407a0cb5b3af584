//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "FUEL_EST_ROOT";

/// Get the software root directory from the `FUEL_EST_ROOT` environment variable.
///
/// The root contains the `params` and `sessions` directories, and is the base that relative data
/// file paths in the parameters are resolved against.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
