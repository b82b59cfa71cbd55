//! File-backed focuser position store
//!
//! The canonical position is kept as decimal text. Writes go to a sibling
//! temporary file first and are renamed into place, so a power cut never
//! leaves a half-written value behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use meridian_hal::store::{PositionStore, StoreError};

/// Position store in a single text file
#[derive(Debug, Clone)]
pub struct FilePositionStore {
    path: PathBuf,
}

impl FilePositionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PositionStore for FilePositionStore {
    fn load(&mut self) -> Result<i32, StoreError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound,
            _ => StoreError::Io,
        })?;
        contents.trim().parse().map_err(|_| StoreError::Corrupted)
    }

    fn save(&mut self, position: i32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|_| StoreError::Io)?;
        }
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, format!("{}\n", position)).map_err(|_| StoreError::Io)?;
        fs::rename(&staging, &self.path).map_err(|_| StoreError::Io)?;
        debug!("Stored canonical position {} in {}", position, self.path.display());
        Ok(())
    }
}
