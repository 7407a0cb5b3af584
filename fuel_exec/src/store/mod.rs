//! # Stores
//!
//! The collection of known paths and the append-only tables produced by the estimator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod paths;
mod tables;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;

use path_if::{codec::EncodeError, DecodeError};
use util::archive::ArchiveError;

pub use paths::*;
pub use tables::*;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No path is stored with id {0}")]
    MissingPath(u64),

    #[error("The stored path {path_id} could not be decoded: {source}")]
    Decode {
        path_id: u64,
        source: DecodeError,
    },

    #[error("Path {path_id} could not be encoded: {source}")]
    Encode {
        path_id: u64,
        source: EncodeError,
    },

    #[error("IO error on {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
