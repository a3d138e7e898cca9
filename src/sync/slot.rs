//! One-record file in the shared directory.
//!
//! Writers replace the whole file through a sibling temp file and a rename,
//! so a reader sees either the previous record or the next one, never a
//! torn mix of both.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use super::error::SyncError;

/// A single JSON record stored at a fixed path.
#[derive(Debug, Clone)]
pub struct SharedSlot {
    path: PathBuf,
}

impl SharedSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record.
    ///
    /// A missing, unreadable or unparseable file all read as `None`.
    pub fn read<T: DeserializeOwned>(&self) -> Option<T> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::trace!(path = %self.path.display(), error = %e, "slot unreadable");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::trace!(path = %self.path.display(), error = %e, "discarding malformed record");
                None
            }
        }
    }

    /// Replaces the record.
    pub fn write<T: Serialize>(&self, value: &T) -> Result<(), SyncError> {
        let tmp = self.stage(value)?;
        tmp.persist(&self.path)
            .map_err(|e| SyncError::io(&self.path, e.error))?;
        Ok(())
    }

    /// Creates the record only if none exists.
    ///
    /// Returns `Ok(false)` when another writer got there first. The record
    /// is complete the moment it becomes visible.
    pub fn create_exclusive<T: Serialize>(&self, value: &T) -> Result<bool, SyncError> {
        let tmp = self.stage(value)?;
        match tmp.persist_noclobber(&self.path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(SyncError::io(&self.path, e.error)),
        }
    }

    /// Deletes the record. A missing file is not an error.
    pub fn remove(&self) -> Result<(), SyncError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::io(&self.path, e)),
        }
    }

    fn stage<T: Serialize>(&self, value: &T) -> Result<NamedTempFile, SyncError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let bytes = serde_json::to_vec(value)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| SyncError::io(parent, e))?;
        tmp.write_all(&bytes).map_err(|e| SyncError::io(parent, e))?;
        tmp.flush().map_err(|e| SyncError::io(parent, e))?;
        Ok(tmp)
    }
}
