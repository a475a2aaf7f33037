pub mod domain;
pub mod identity;
pub mod ports;
pub mod reading;

#[cfg(test)]
pub(crate) mod testing;

pub use domain::{
    compute_percent, progress_status, ProgressStatus, RawProgressRecord, ReadingProgress,
    RemoteProgress, UserProfile,
};
pub use identity::{is_canonical_id, IdentityResolver};
pub use ports::{LocalStore, PortError, PortResult, RemoteProgressService, StorageKeys};
pub use reading::ReadingService;
