//! crates/reading_library_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the on-device
//! store or the remote progress service.

use async_trait::async_trait;

use crate::domain::RawProgressRecord;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Key Configuration
//=========================================================================================

/// Names of the on-device storage slots.
///
/// Passed to the services at construction rather than hard-coded, so the key
/// layout is configuration. The defaults are the historical key names the
/// device store already holds.
#[derive(Debug, Clone)]
pub struct StorageKeys {
    /// Slot holding the canonical user id string.
    pub user_id: String,
    /// Slot holding the JSON-serialized user profile.
    pub user_profile: String,
    /// Slot holding the opaque auth token.
    pub auth_token: String,
    /// Prefix for per-book progress keys; `{prefix}_{book_id}`.
    pub progress_prefix: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            user_id: "user_id".to_string(),
            user_profile: "user_data".to_string(),
            auth_token: "auth_token".to_string(),
            progress_prefix: "reading_progress".to_string(),
        }
    }
}

impl StorageKeys {
    /// The device-store key for one book's progress record.
    pub fn progress_key(&self, book_id: &str) -> String {
        format!("{}_{}", self.progress_prefix, book_id)
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The on-device key-value store. Synchronous: the backing store lives on
/// the client device and reads and writes complete before returning, so a
/// write is visible to the next read within the same process.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;

    /// Every key currently present in the store.
    fn list_keys(&self) -> PortResult<Vec<String>>;
}

/// The remote reading-progress authority.
#[async_trait]
pub trait RemoteProgressService: Send + Sync {
    /// Records that the user is on `page` of `book_id`. Upserts remotely.
    async fn start(&self, user_id: &str, book_id: &str, page: u32) -> PortResult<()>;

    /// The full list of progress records the remote holds for this user,
    /// in the raw wire shape.
    async fn fetch_progress_list(&self, user_id: &str) -> PortResult<Vec<RawProgressRecord>>;

    /// Removes the remote record for one user×book pair.
    async fn delete_progress(&self, user_id: &str, book_id: &str) -> PortResult<()>;
}
