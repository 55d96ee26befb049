//! # JSON File Storage
//!
//! File-based storage backend keeping one JSON document per key under a
//! data directory.
//!
//! ## File Structure
//!
//! ```text
//! data/
//! ├── current_period.json
//! ├── archived_periods.json
//! └── records_backup.json
//! ```
//!
//! Writes go to a temp file in the same directory and are renamed into
//! place, so a reader never observes a half-written blob.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use thiserror::Error;
use tokio::fs;

use super::traits::Storage;

/// Errors raised when setting up or addressing the file backend.
#[derive(Debug, Error)]
pub enum JsonFileStorageError {
    #[error("failed to create data directory {path}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage key {0:?} is not a valid file name")]
    InvalidKey(String),
}

/// Storage backend that persists each key as `<key>.json` in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    base_dir: PathBuf,
}

impl JsonFileStorage {
    /// Create the backend, creating `base_dir` if it does not exist yet.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, JsonFileStorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir).map_err(|source| JsonFileStorageError::CreateDataDir {
            path: base_dir.clone(),
            source,
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Keys map directly to file names, so only plain identifier characters
    /// are accepted.
    fn file_path(&self, key: &str) -> Result<PathBuf, JsonFileStorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(JsonFileStorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.file_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.file_path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to replace {}", path.display()))?;
        debug!("Wrote {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.file_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove {}", path.display()))
            }
        }
    }
}
