//! Struct archiving functionality
//!
//! Records are written to and read from CSV files using serde. Archives are append-only: opening
//! an existing archive never truncates it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::{ReaderBuilder, WriterBuilder};
pub use csv::Writer;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    path: PathBuf,
    writer: Writer<File>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while reading or writing archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot open the archive at {0:?}: {1}")]
    OpenError(PathBuf, std::io::Error),

    #[error("Cannot write a record to the archive at {0:?}: {1}")]
    WriteError(PathBuf, csv::Error),

    #[error("Cannot flush the archive at {0:?}: {1}")]
    FlushError(PathBuf, std::io::Error),

    #[error("Cannot read a record from the archive at {0:?}: {1}")]
    ReadError(PathBuf, csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    ///
    /// Session archives are written with a header line.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        Self::append_to(session.arch_root.join(path), true)
    }

    /// Open an archive at the given path in append mode, creating it if it does not exist.
    ///
    /// Headers are only written if `has_headers` is set and the file is empty, so appending to an
    /// existing archive never repeats the header.
    pub fn append_to<P: AsRef<Path>>(path: P, has_headers: bool) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();

        // Create the parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ArchiveError::OpenError(path.clone(), e))?;
            }
        }

        // Open the file in append mode
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ArchiveError::OpenError(path.clone(), e))?;

        let is_empty = file
            .metadata()
            .map(|m| m.len() == 0)
            .map_err(|e| ArchiveError::OpenError(path.clone(), e))?;

        let writer = WriterBuilder::new()
            .has_headers(has_headers && is_empty)
            .from_writer(file);

        Ok(Self { path, writer })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        self.writer
            .serialize(record)
            .map_err(|e| ArchiveError::WriteError(self.path.clone(), e))?;
        self.writer
            .flush()
            .map_err(|e| ArchiveError::FlushError(self.path.clone(), e))
    }

    /// Get the path this archive writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read every record from the archive at the given path.
pub fn read_records<T, P>(path: P, has_headers: bool) -> Result<Vec<T>, ArchiveError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref().to_path_buf();

    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .from_path(&path)
        .map_err(|e| ArchiveError::ReadError(path.clone(), e))?;

    reader
        .deserialize()
        .map(|r| r.map_err(|e| ArchiveError::ReadError(path.clone(), e)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        value: f64,
    }

    #[test]
    fn test_append_and_read() {
        let path = std::env::temp_dir().join("util_archive_test_append_and_read.csv");
        let _ = std::fs::remove_file(&path);

        {
            let mut arch = Archiver::append_to(&path, false).unwrap();
            assert_eq!(arch.path(), path.as_path());
            arch.serialise(Row { id: 1, value: 0.5 }).unwrap();
        }

        // Reopening appends rather than truncating
        {
            let mut arch = Archiver::append_to(&path, false).unwrap();
            arch.serialise(Row { id: 2, value: 1.5 }).unwrap();
        }

        let rows: Vec<Row> = read_records(&path, false).unwrap();
        assert_eq!(
            rows,
            vec![Row { id: 1, value: 0.5 }, Row { id: 2, value: 1.5 }]
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_header_written_once() {
        let path = std::env::temp_dir().join("util_archive_test_header_written_once.csv");
        let _ = std::fs::remove_file(&path);

        for i in 0..2 {
            let mut arch = Archiver::append_to(&path, true).unwrap();
            arch.serialise(Row { id: i, value: 0.0 }).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("id,value").count(), 1);

        let rows: Vec<Row> = read_records(&path, true).unwrap();
        assert_eq!(rows.len(), 2);

        std::fs::remove_file(&path).unwrap();
    }
}
