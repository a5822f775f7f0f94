//! Client-side key/value storage.
//!
//! A flat string map persisted as one JSON file. Every write rewrites the
//! whole file through a temp file in the same directory followed by a rename,
//! so a crash mid-write leaves either the old or the new contents on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use heirloom_core::CartSessionId;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Storage keys.
pub mod keys {
    /// Anonymous cart session id (a UUID v4).
    pub const CART_SESSION_ID: &str = "cartSessionId";

    /// Bearer token returned by login/register.
    pub const AUTH_TOKEN: &str = "authToken";
}

/// Errors from reading or writing the storage file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

enum Backend {
    File(PathBuf),
    Memory,
}

/// Persistent string map shared by the cart store and auth session.
pub struct LocalStorage {
    backend: Backend,
    entries: Mutex<BTreeMap<String, String>>,
}

impl std::fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = match &self.backend {
            Backend::File(path) => Some(path.as_path()),
            Backend::Memory => None,
        };
        // Values may be tokens, so only keys are shown.
        let keys: Vec<String> = self.lock().keys().cloned().collect();
        f.debug_struct("LocalStorage")
            .field("path", &path)
            .field("keys", &keys)
            .finish()
    }
}

impl LocalStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// logged and replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable storage file");
                BTreeMap::new()
            }
        };

        Ok(Self {
            backend: Backend::File(path),
            entries: Mutex::new(entries),
        })
    }

    /// A store that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Read a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Write a value and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written. The in-memory value is
    /// updated regardless.
    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.into());
        self.persist(&entries)
    }

    /// Delete a value and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }

    /// Write the current contents to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn flush(&self) -> Result<(), StorageError> {
        let entries = self.lock();
        self.persist(&entries)
    }

    /// The cart session id, generating and storing a new one on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if a newly generated id cannot be persisted.
    pub fn cart_session_id(&self) -> Result<CartSessionId, StorageError> {
        let mut entries = self.lock();
        if let Some(existing) = entries
            .get(keys::CART_SESSION_ID)
            .map(|raw| CartSessionId::new(raw.clone()))
            .filter(|id| !id.is_blank())
        {
            return Ok(existing);
        }

        let id = CartSessionId::generate();
        tracing::debug!(session_id = %id, "Generated new cart session id");
        entries.insert(keys::CART_SESSION_ID.to_string(), id.to_string());
        self.persist(&entries)?;
        Ok(id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        match &self.backend {
            Backend::File(path) => write_atomic(path, entries),
            Backend::Memory => Ok(()),
        }
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_atomic(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, entries)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_generated_once() {
        let storage = LocalStorage::in_memory();
        let first = storage.cart_session_id().unwrap();
        let second = storage.cart_session_id().unwrap();

        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(first.as_str()).is_ok());
        assert_eq!(
            storage.get(keys::CART_SESSION_ID).as_deref(),
            Some(first.as_str())
        );
    }

    #[test]
    fn test_blank_session_id_is_replaced() {
        let storage = LocalStorage::in_memory();
        storage.set(keys::CART_SESSION_ID, "   ").unwrap();
        let id = storage.cart_session_id().unwrap();
        assert!(!id.is_blank());
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let session = {
            let storage = LocalStorage::open(&path).unwrap();
            storage.set(keys::AUTH_TOKEN, "token-123").unwrap();
            storage.cart_session_id().unwrap()
        };

        let reopened = LocalStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::AUTH_TOKEN).as_deref(), Some("token-123"));
        assert_eq!(reopened.cart_session_id().unwrap(), session);

        reopened.remove(keys::AUTH_TOKEN).unwrap();
        let again = LocalStorage::open(&path).unwrap();
        assert!(again.get(keys::AUTH_TOKEN).is_none());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();

        let storage = LocalStorage::open(&path).unwrap();
        assert!(storage.get(keys::CART_SESSION_ID).is_none());

        storage.set("k", "v").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"k\": \"v\""));
    }

    #[test]
    fn test_debug_hides_values() {
        let storage = LocalStorage::in_memory();
        storage.set(keys::AUTH_TOKEN, "very-secret").unwrap();
        let debug = format!("{storage:?}");
        assert!(debug.contains("authToken"));
        assert!(!debug.contains("very-secret"));
    }
}
