//! crates/reading_library_core/src/reading.rs
//!
//! The progress reconciler: decides per operation whether the remote service
//! or the device store is the authority for reading progress, and keeps the
//! device store current regardless of how the remote call went.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::domain::{compute_percent, progress_status, ReadingProgress};
use crate::ports::{LocalStore, PortError, PortResult, RemoteProgressService, StorageKeys};

/// Reconciles reading progress between the device store and the remote
/// service.
///
/// Authority rule: once a canonical user id exists, the remote list is the
/// source of truth for reads; without one (guest mode), or when the remote
/// call fails, the device store answers. Writes always land locally; the
/// remote write is best-effort.
#[derive(Clone)]
pub struct ReadingService {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteProgressService>,
    keys: StorageKeys,
}

impl ReadingService {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteProgressService>,
        keys: StorageKeys,
    ) -> Self {
        Self {
            store,
            remote,
            keys,
        }
    }

    /// The canonical user id, re-read from the store on every operation so a
    /// login or logout takes effect immediately. A store failure here is
    /// logged and treated as guest mode.
    fn current_user_id(&self) -> Option<String> {
        match self.store.get(&self.keys.user_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "could not read user id; treating as guest");
                None
            }
        }
    }

    /// Records that the reader is on `current_page` of `book_id`.
    ///
    /// When an identity exists the remote write is attempted first, but its
    /// failure is swallowed: the local write below happens no matter what,
    /// so the device store always reflects the latest observed page. Only a
    /// local store failure propagates.
    pub async fn save_progress(
        &self,
        book_id: &str,
        current_page: u32,
        total_pages: Option<u32>,
    ) -> PortResult<()> {
        let user_id = self.current_user_id();
        if let Some(user_id) = &user_id {
            if let Err(e) = self.remote.start(user_id, book_id, current_page).await {
                warn!(book_id, error = %e, "remote progress write failed; keeping local copy");
            }
        }

        let record = ReadingProgress {
            book_id: book_id.to_string(),
            user_id,
            current_page,
            progress: compute_percent(current_page, total_pages),
            total_pages,
            status: progress_status(current_page, total_pages),
            last_read_at: Utc::now(),
        };
        let raw = serde_json::to_string(&record)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(&self.keys.progress_key(book_id), &raw)
    }

    /// The progress record for one book.
    ///
    /// With an identity, the remote list is authoritative: a book absent
    /// from it reads as `None` even if a stale local record exists. The
    /// device store answers only in guest mode or when the remote call
    /// fails.
    pub async fn get_progress(&self, book_id: &str) -> PortResult<Option<ReadingProgress>> {
        if let Some(user_id) = self.current_user_id() {
            match self.remote.fetch_progress_list(&user_id).await {
                Ok(list) => {
                    return Ok(list
                        .into_iter()
                        .filter_map(|raw| raw.normalize())
                        .find(|p| p.book_id == book_id)
                        .map(|p| p.into_domain()));
                }
                Err(e) => {
                    warn!(book_id, error = %e, "remote progress fetch failed; falling back to local");
                }
            }
        }
        self.read_local(book_id)
    }

    /// Every known progress record, keyed by book id.
    pub async fn get_all_progress(&self) -> PortResult<HashMap<String, ReadingProgress>> {
        if let Some(user_id) = self.current_user_id() {
            match self.remote.fetch_progress_list(&user_id).await {
                Ok(list) => {
                    return Ok(list
                        .into_iter()
                        .filter_map(|raw| raw.normalize())
                        .map(|p| (p.book_id.clone(), p.into_domain()))
                        .collect());
                }
                Err(e) => {
                    warn!(error = %e, "remote progress fetch failed; falling back to local");
                }
            }
        }

        let prefix = format!("{}_", self.keys.progress_prefix);
        let mut all = HashMap::new();
        for key in self.store.list_keys()? {
            let Some(book_id) = key.strip_prefix(&prefix) else {
                continue;
            };
            if let Some(record) = self.read_local(book_id)? {
                all.insert(book_id.to_string(), record);
            }
        }
        Ok(all)
    }

    /// Removes progress for one book. The remote delete is best-effort; the
    /// local key goes away regardless.
    pub async fn clear_progress(&self, book_id: &str) -> PortResult<()> {
        if let Some(user_id) = self.current_user_id() {
            if let Err(e) = self.remote.delete_progress(&user_id, book_id).await {
                warn!(book_id, error = %e, "remote progress delete failed; removing local copy anyway");
            }
        }
        self.store.remove(&self.keys.progress_key(book_id))
    }

    /// Reads one record from the device store. A corrupt record is logged
    /// and treated as absent; only store failures propagate.
    fn read_local(&self, book_id: &str) -> PortResult<Option<ReadingProgress>> {
        let Some(raw) = self.store.get(&self.keys.progress_key(book_id))? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(book_id, error = %e, "corrupt local progress record; treating as absent");
                Ok(None)
            }
        }
    }
}
