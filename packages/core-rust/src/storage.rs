//! Small on-disk persistence: typed preferences and whole-file helpers.
//!
//! A [`Preferences`] store is a single JSON object file. Every write
//! commits synchronously, so the file on disk always reflects the last
//! completed `set_*` call.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::contract;

/// Failure while reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failure")]
    Io(#[from] io::Error),
    #[error("preferences store holds invalid JSON: {0}")]
    Corrupt(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Typed key/value store backed by one JSON file.
///
/// Reads are served from memory; every `set_*` rewrites the backing file
/// before returning. Missing keys fall back to `None`, `false`, and `0`
/// respectively, and a value read with the wrong type behaves like a
/// missing one.
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl Preferences {
    /// Opens the store at `path`, starting empty when the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` when an existing file cannot be read and
    /// `StorageError::Corrupt` when its content is not a JSON object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<HashMap<String, Value>>(&content)
                .map_err(StorageError::Corrupt)?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => return Err(StorageError::Io(error)),
        };
        debug!(path = %path.display(), entries = entries.len(), "opened preference store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Stores a string under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing file cannot be rewritten.
    pub fn set_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set(key, Value::String(value.to_owned()))
    }

    /// String stored under `key`, or `None`.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        contract::require_non_empty(key, "preference key must not be empty");
        self.entries
            .lock()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    /// Stores a boolean under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing file cannot be rewritten.
    pub fn set_bool(&self, key: &str, value: bool) -> Result<(), StorageError> {
        self.set(key, Value::Bool(value))
    }

    /// Boolean stored under `key`, or `false`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        contract::require_non_empty(key, "preference key must not be empty");
        self.entries
            .lock()
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Stores an integer under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing file cannot be rewritten.
    pub fn set_int(&self, key: &str, value: i64) -> Result<(), StorageError> {
        self.set(key, Value::from(value))
    }

    /// Integer stored under `key`, or `0`.
    #[must_use]
    pub fn get_int(&self, key: &str) -> i64 {
        contract::require_non_empty(key, "preference key must not be empty");
        self.entries
            .lock()
            .get(key)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        contract::require_non_empty(key, "preference key must not be empty");
        let mut entries = self.entries.lock();
        entries.insert(key.to_owned(), value);
        // Committed under the entry lock: concurrent writers serialize and
        // the file always holds a complete object.
        let json = serde_json::to_vec_pretty(&*entries).map_err(StorageError::Corrupt)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// Writes `content` to `path`, replacing any previous content.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn write_text_file(path: impl AsRef<Path>, content: &str) -> Result<(), StorageError> {
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}

/// Reads the file at `path` as UTF-8 text, `None` when it does not exist.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read.
pub fn read_text_file(path: impl AsRef<Path>) -> Result<Option<String>, StorageError> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(StorageError::Io(error)),
    }
}
