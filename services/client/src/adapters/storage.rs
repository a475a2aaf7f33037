//! services/client/src/adapters/storage.rs
//!
//! This module contains the device-store adapter, the concrete implementation
//! of the `LocalStore` port from the `core` crate. It keeps the whole store
//! as one JSON object in a file, the stand-in for the browser's localStorage
//! the original client persisted into.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use reading_library_core::ports::{LocalStore, PortError, PortResult};

/// A `LocalStore` backed by a single JSON file.
///
/// The file is read once at open; every mutation rewrites it before
/// returning, so a write is durable and visible to the next read.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file reads as an empty store; a
    /// present but unparsable file is an error rather than silent data loss.
    pub fn open(path: impl AsRef<Path>) -> PortResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                PortError::Unexpected(format!("corrupt store file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(PortError::Unexpected(format!(
                    "could not read store file {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| {
            PortError::Unexpected(format!(
                "could not write store file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn list_keys(&self) -> PortResult<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }
}
