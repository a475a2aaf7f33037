//! crates/reading_library_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage backend or transport format,
//! except for the serde attributes that pin the historical on-device and
//! on-the-wire field spellings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a book is still being read or has been finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
}

/// Reading progress for one user×book pair.
///
/// The on-device records were historically written in camelCase, so the serde
/// representation keeps that spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    pub book_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// 1-indexed page the reader is on.
    pub current_page: u32,
    /// Cached percentage in [0, 100]. Always recomputable from
    /// `current_page` and `total_pages`; never a source of truth.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    pub status: ProgressStatus,
    pub last_read_at: DateTime<Utc>,
}

/// The persisted user profile record, with an embedded copy of the canonical
/// user id that identity migration keeps in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

//=========================================================================================
// Remote Wire Shapes
//=========================================================================================

/// A progress record as the remote service returns it.
///
/// The service has emitted both snake_case and camelCase spellings over time,
/// so every field accepts both. Nothing past the port boundary touches this
/// type: [`RawProgressRecord::normalize`] is the single place the dual naming
/// is resolved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProgressRecord {
    #[serde(default, alias = "bookId")]
    pub book_id: Option<String>,
    #[serde(default, alias = "currentPage")]
    pub current_page: Option<u32>,
    /// Percentage complete. The snake_case emitter calls this `page`.
    #[serde(default, rename = "page", alias = "progress")]
    pub percent: Option<f64>,
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default, rename = "updatedAt", alias = "lastReadAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RawProgressRecord {
    /// Collapses the dual-named wire record into the canonical internal
    /// shape. A record carrying neither spelling of the book id or the
    /// current page is unusable and normalizes to `None`.
    pub fn normalize(self) -> Option<RemoteProgress> {
        Some(RemoteProgress {
            book_id: self.book_id?,
            current_page: self.current_page?,
            percent: self.percent.unwrap_or(0.0),
            user_id: self.user_id,
            updated_at: self.updated_at,
        })
    }
}

/// The canonical internal shape of a remote progress record.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteProgress {
    pub book_id: String,
    pub current_page: u32,
    pub percent: f64,
    pub user_id: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteProgress {
    /// Maps a remote record to the domain type. The remote list carries no
    /// page totals, so the mapped record has none and always reads as still
    /// in progress.
    pub fn into_domain(self) -> ReadingProgress {
        ReadingProgress {
            book_id: self.book_id,
            user_id: self.user_id,
            current_page: self.current_page,
            progress: self.percent,
            total_pages: None,
            status: ProgressStatus::InProgress,
            last_read_at: self.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

//=========================================================================================
// Derivations
//=========================================================================================

/// Percentage complete, rounded to the nearest integer and clamped to 100.
/// An absent or zero page total yields 0 rather than dividing by zero.
pub fn compute_percent(current_page: u32, total_pages: Option<u32>) -> f64 {
    match total_pages {
        Some(total) if total > 0 => {
            let pct = (f64::from(current_page) / f64::from(total) * 100.0).round();
            pct.min(100.0)
        }
        _ => 0.0,
    }
}

/// `Completed` exactly when the reader is on the last known page.
pub fn progress_status(current_page: u32, total_pages: Option<u32>) -> ProgressStatus {
    if total_pages == Some(current_page) {
        ProgressStatus::Completed
    } else {
        ProgressStatus::InProgress
    }
}
