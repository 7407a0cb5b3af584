//! Keyed collection of serialized paths.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::fs;
use std::path::Path as FsPath;

use log::{debug, info, warn};
use path_if::Path;

use super::StoreError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// All known paths, keyed by path id.
///
/// Paths are held as serialized blobs and only decoded when requested, so one corrupt blob does
/// not prevent the others from being used.
#[derive(Debug, Clone, Default)]
pub struct PathStore {
    blobs: BTreeMap<u64, String>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every path in a directory, where each file is named by its path id and contains the
    /// serialized path.
    ///
    /// Files whose names are not path ids, or which cannot be read, are skipped with a warning.
    pub fn load_dir<P: AsRef<FsPath>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        let mut store = Self::new();

        let entries =
            fs::read_dir(dir).map_err(|e| StoreError::Io(dir.to_path_buf(), e))?;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Couldn't read an entry of {:?}: {}", dir, e);
                    continue;
                }
            };

            let file_path = entry.path();
            if !file_path.is_file() {
                continue;
            }

            let path_id = match file_path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<u64>().ok())
            {
                Some(id) => id,
                None => {
                    warn!("Skipping {:?}, file name is not a path id", file_path);
                    continue;
                }
            };

            match fs::read_to_string(&file_path) {
                Ok(blob) => {
                    store.blobs.insert(path_id, blob);
                }
                Err(e) => warn!("Couldn't read path file {:?}: {}", file_path, e),
            }
        }

        info!("Loaded {} paths from {:?}", store.len(), dir);

        Ok(store)
    }

    /// Write every path into a directory, one file per path named by its id.
    pub fn save_dir<P: AsRef<FsPath>>(&self, dir: P) -> Result<(), StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| StoreError::Io(dir.to_path_buf(), e))?;

        for (path_id, blob) in self.blobs.iter() {
            let file_path = dir.join(path_id.to_string());
            fs::write(&file_path, blob).map_err(|e| StoreError::Io(file_path, e))?;
        }

        debug!("Saved {} paths to {:?}", self.len(), dir);

        Ok(())
    }

    /// Insert a serialized path, replacing any previous path with the same id.
    pub fn insert_blob(&mut self, path_id: u64, blob: String) {
        self.blobs.insert(path_id, blob);
    }

    /// Serialize and insert a path, replacing any previous path with the same id.
    pub fn insert_path(&mut self, path_id: u64, path: &Path) -> Result<(), StoreError> {
        let blob = path
            .encode()
            .map_err(|source| StoreError::Encode { path_id, source })?;
        self.blobs.insert(path_id, blob);
        Ok(())
    }

    /// Decode the path with the given id.
    pub fn get(&self, path_id: u64) -> Result<Path, StoreError> {
        let blob = self
            .blobs
            .get(&path_id)
            .ok_or(StoreError::MissingPath(path_id))?;

        Path::decode(blob).map_err(|source| StoreError::Decode { path_id, source })
    }

    /// Ids of all stored paths, in ascending order.
    pub fn path_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.blobs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use path_if::GeoPoint;

    fn line_path() -> Path {
        let mut path = Path::new_empty();
        path.add_point(GeoPoint::new(40.0, -105.0, 1600.0), None).unwrap();
        path.add_point(GeoPoint::new(40.0001, -105.0, 1600.0), None).unwrap();
        path
    }

    #[test]
    fn test_keyed_lookup() {
        let mut store = PathStore::new();
        store.insert_path(7, &line_path()).unwrap();
        store.insert_blob(9, String::from("this is not a path"));

        assert_eq!(store.get(7).unwrap(), line_path());

        match store.get(8) {
            Err(StoreError::MissingPath(8)) => (),
            r => panic!("Expected a missing path, got {:?}", r),
        }
        match store.get(9) {
            Err(StoreError::Decode { path_id: 9, .. }) => (),
            r => panic!("Expected a decode error, got {:?}", r),
        }

        assert_eq!(store.path_ids().collect::<Vec<_>>(), vec![7, 9]);
    }

    #[test]
    fn test_dir_round_trip() {
        let dir = std::env::temp_dir().join("fuel_lib_path_store_test_dir_round_trip");
        let _ = fs::remove_dir_all(&dir);

        let mut store = PathStore::new();
        store.insert_path(1, &line_path()).unwrap();
        store.insert_path(22, &Path::new_empty()).unwrap();
        store.save_dir(&dir).unwrap();

        // Stray files are ignored
        fs::write(dir.join("README"), "not a path").unwrap();

        let loaded = PathStore::load_dir(&dir).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(1).unwrap(), line_path());
        assert_eq!(loaded.get(22).unwrap(), Path::new_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_dir() {
        let dir = std::env::temp_dir().join("fuel_lib_path_store_test_missing_dir");
        let _ = fs::remove_dir_all(&dir);

        match PathStore::load_dir(&dir) {
            Err(StoreError::Io(..)) => (),
            r => panic!("Expected an io error, got {:?}", r),
        }
    }
}
