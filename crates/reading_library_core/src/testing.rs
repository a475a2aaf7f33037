//! crates/reading_library_core/src/testing.rs
//!
//! In-memory fakes for the ports, shared by the unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::RawProgressRecord;
use crate::ports::{LocalStore, PortError, PortResult, RemoteProgressService};

/// A `LocalStore` backed by a map, with write counting and per-key read
/// poisoning for failure-path tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    poisoned: Mutex<Vec<String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Number of `set`/`remove` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent `get` of `key` fail.
    pub fn poison(&self, key: &str) {
        self.poisoned.lock().unwrap().push(key.to_string());
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        if self.poisoned.lock().unwrap().iter().any(|k| k == key) {
            return Err(PortError::Unexpected(format!("poisoned key {key}")));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn list_keys(&self) -> PortResult<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }
}

/// A scripted `RemoteProgressService` that records every call.
#[derive(Default)]
pub struct FakeRemote {
    /// Records returned by `fetch_progress_list`.
    pub list: Mutex<Vec<RawProgressRecord>>,
    pub fail_start: bool,
    pub fail_fetch: bool,
    pub fail_delete: bool,
    pub started: Mutex<Vec<(String, String, u32)>>,
    pub deleted: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl RemoteProgressService for FakeRemote {
    async fn start(&self, user_id: &str, book_id: &str, page: u32) -> PortResult<()> {
        if self.fail_start {
            return Err(PortError::Unexpected("remote start failed".to_string()));
        }
        self.started
            .lock()
            .unwrap()
            .push((user_id.to_string(), book_id.to_string(), page));
        Ok(())
    }

    async fn fetch_progress_list(&self, _user_id: &str) -> PortResult<Vec<RawProgressRecord>> {
        if self.fail_fetch {
            return Err(PortError::Unexpected("remote fetch failed".to_string()));
        }
        Ok(self.list.lock().unwrap().clone())
    }

    async fn delete_progress(&self, user_id: &str, book_id: &str) -> PortResult<()> {
        if self.fail_delete {
            return Err(PortError::Unexpected("remote delete failed".to_string()));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((user_id.to_string(), book_id.to_string()));
        Ok(())
    }
}
