//! Storage
//!
//! Persists the whole checkout between sessions. Every save rewrites the full document.

use std::{
    fmt::Debug,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::checkout::PersistedCheckout;

/// Errors reading or writing a persisted checkout.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("checkout storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded or decoded.
    #[error("checkout storage document is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the checkout is kept between sessions.
pub trait SnapshotStorage: Debug {
    /// Load the saved checkout, if there is one.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the saved checkout exists but cannot be read.
    fn load(&self) -> Result<Option<PersistedCheckout>, StorageError>;

    /// Replace the saved checkout.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the checkout cannot be written. The previously saved
    /// checkout is kept in that case.
    fn save(&mut self, checkout: &PersistedCheckout) -> Result<(), StorageError>;

    /// Forget the saved checkout.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the saved checkout cannot be removed.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Keeps the last saved checkout as a JSON document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    document: Option<String>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw saved document.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedCheckout>, StorageError> {
        self.document
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(StorageError::from)
    }

    fn save(&mut self, checkout: &PersistedCheckout) -> Result<(), StorageError> {
        self.document = Some(serde_json::to_string(checkout)?);

        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.document = None;

        Ok(())
    }
}

/// Keeps the checkout in a JSON file. Writes go to a sibling temporary file that is then
/// renamed over the target, so readers never see a half-written document.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Store the checkout at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the checkout is stored in.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedCheckout>, StorageError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&mut self, checkout: &PersistedCheckout) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(checkout)?;

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();

        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), "saved checkout");

        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
