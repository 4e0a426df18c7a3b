//! State reconciliation engine.
//!
//! Keeps the persisted profiles, tabs and saved pages consistent with the
//! browser's profile registry and the snapshot directory on disk.

mod error;
mod profile_cache;
pub mod profile_source;
mod reconciler;
pub mod saved_pages;
pub mod snapshot_fs;
pub mod tab_sync;

pub use error::EngineError;
pub use profile_cache::ProfileCache;
pub use profile_source::{LocalStateSource, ProfileInfo, ProfileInfoMap, SourceError};
pub use reconciler::{ProfileMap, ProfileReconciler, ProfileView, RepairReport};
pub use saved_pages::{
    DeleteOutcome, DeleteTarget, PageId, SavedPageEntry, SavedPageManager, SnapshotDiff,
};
pub use snapshot_fs::{FileState, Removal};
pub use tab_sync::{ProfileReport, ReportedTab, TabSyncOutcome, TabSynchronizer};

/// Profile ids are compared case-insensitively; they are stored lower-cased.
pub fn normalize_profile_id(profile_id: &str) -> String {
    profile_id.trim().to_lowercase()
}
