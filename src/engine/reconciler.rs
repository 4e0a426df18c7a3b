//! Profile identity reconciliation.
//!
//! Merges the browser's Local State profile registry with the durable profile
//! table, minting stable ids for directories seen for the first time, and keeps
//! the merged view in a TTL cache.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::profile_cache::ProfileCache;
use super::profile_source::{seed_profiles, LocalStateSource, ProfileInfo, ProfileInfoMap};
use crate::data::{Profile, ProfileStore, UNKNOWN_USER};

/// Merged view of one browser profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub profile_id: String,
    pub name: String,
    #[serde(rename = "profileDir")]
    pub directory: String,
    pub user_id: String,
    pub email: String,
}

/// Resolved profiles keyed by lower-cased directory.
pub type ProfileMap = BTreeMap<String, ProfileView>;

/// Rows removed by a duplicate-directory repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub removed_profile_ids: Vec<String>,
}

pub struct ProfileReconciler {
    profiles: ProfileStore,
    source: LocalStateSource,
    cache: Mutex<ProfileCache>,
}

impl ProfileReconciler {
    pub fn new(profiles: ProfileStore, source: LocalStateSource, ttl: Duration) -> Self {
        Self {
            profiles,
            source,
            cache: Mutex::new(ProfileCache::new(ttl)),
        }
    }

    /// Drop the cached mapping so the next resolve performs a full pass.
    pub fn invalidate(&self) {
        self.cache.lock().invalidate();
    }

    /// Resolve the authoritative profile mapping.
    ///
    /// Never fails: an unreadable Local State falls back to the built-in seed,
    /// row-level errors are logged, and a failing store yields the previous
    /// mapping (or an empty one).
    pub async fn resolve_profiles(&self, force_refresh: bool) -> Arc<ProfileMap> {
        if force_refresh {
            debug!("Profile cache cleared due to forced refresh");
            self.invalidate();
        } else {
            let cached = self.cache.lock().fresh(Instant::now());
            if let Some(cached) = cached {
                debug!(profiles = cached.len(), "Using cached profile info");
                return cached;
            }
        }

        let info = match self.source.load().await {
            Ok(info) => {
                debug!(profiles = info.len(), "Read browser profile info");
                info
            }
            Err(e) => {
                warn!(error = %e, "Local State not accessible, using fallback profiles");
                seed_profiles()
            }
        };

        let existing = match self.profiles.get_all() {
            Ok(existing) => existing,
            Err(e) => {
                error!(error = %e, "Failed to load stored profiles");
                return self
                    .cache
                    .lock()
                    .last()
                    .unwrap_or_else(|| Arc::new(ProfileMap::new()));
            }
        };

        let mapping = self.merge(&info, &existing);
        let report = self.repair_duplicate_directories();
        if !report.removed_profile_ids.is_empty() {
            info!(
                removed = report.removed_profile_ids.len(),
                "Removed profiles with duplicate directories"
            );
        }

        let mapping = Arc::new(mapping);
        self.cache.lock().store(mapping.clone(), Instant::now());
        mapping
    }

    /// Merge browser-reported profiles into the store and build the mapping.
    fn merge(&self, info: &ProfileInfoMap, existing: &[Profile]) -> ProfileMap {
        let mut ids_by_dir: HashMap<String, String> = HashMap::new();
        for profile in existing {
            if let Some(dir) = &profile.directory {
                ids_by_dir
                    .entry(dir.to_lowercase())
                    .or_insert_with(|| profile.profile_id.clone());
            }
        }

        let mut mapping = ProfileMap::new();
        for (directory, profile_info) in info {
            let dir_key = directory.to_lowercase();
            let name = profile_info
                .display_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Profile {directory}"));
            let user_id = profile_info.account_id().unwrap_or(UNKNOWN_USER).to_string();

            let profile_id = match ids_by_dir.get(&dir_key) {
                Some(id) => id.clone(),
                None => {
                    let id = self.insert_discovered(&name, &dir_key, &user_id);
                    ids_by_dir.insert(dir_key.clone(), id.clone());
                    id
                }
            };

            debug!(
                directory = %directory,
                profile_id = %profile_id,
                name = %name,
                user_id = %user_id,
                "Profile found"
            );
            mapping.insert(
                dir_key.clone(),
                view(profile_id, name, dir_key, user_id, profile_info),
            );
        }
        mapping
    }

    /// Insert a newly seen directory and return the id stored for it.
    fn insert_discovered(&self, name: &str, directory: &str, user_id: &str) -> String {
        let profile = Profile::discovered(name, directory, user_id);
        match self.profiles.insert_or_ignore(&profile) {
            Ok(true) => {
                info!(directory = %directory, profile_id = %profile.profile_id, "Added profile");
                profile.profile_id
            }
            Ok(false) => match self.profiles.get_by_directory(directory) {
                Ok(Some(stored)) => stored.profile_id,
                Ok(None) => profile.profile_id,
                Err(e) => {
                    error!(directory = %directory, error = %e, "Failed to look up profile");
                    profile.profile_id
                }
            },
            Err(e) => {
                error!(directory = %directory, error = %e, "Error adding profile");
                profile.profile_id
            }
        }
    }

    /// Restore directory uniqueness: for every lower-cased directory stored
    /// more than once, delete all rows after the first together with their tabs.
    pub fn repair_duplicate_directories(&self) -> RepairReport {
        let mut report = RepairReport::default();
        let profiles = match self.profiles.get_all() {
            Ok(profiles) => profiles,
            Err(e) => {
                error!(error = %e, "Failed to load profiles for duplicate check");
                return report;
            }
        };

        let mut seen = HashSet::new();
        for profile in profiles {
            let Some(dir) = profile.directory.as_deref() else {
                continue;
            };
            if seen.insert(dir.to_lowercase()) {
                continue;
            }
            match self.profiles.delete_with_tabs(&profile.profile_id) {
                Ok(_) => {
                    warn!(
                        profile_id = %profile.profile_id,
                        directory = %dir,
                        "Deleted duplicate profile"
                    );
                    report.removed_profile_ids.push(profile.profile_id);
                }
                Err(e) => {
                    error!(profile_id = %profile.profile_id, error = %e, "Error deleting duplicate profile");
                }
            }
        }
        report
    }
}

fn view(
    profile_id: String,
    name: String,
    directory: String,
    user_id: String,
    info: &ProfileInfo,
) -> ProfileView {
    ProfileView {
        profile_id,
        name,
        directory,
        user_id,
        email: info.email().unwrap_or(UNKNOWN_USER).to_string(),
    }
}
