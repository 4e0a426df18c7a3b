//! Tab set synchronization.
//!
//! The extension always reports the complete tab set of a profile, so a sync
//! replaces the stored set instead of merging into it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::EngineError;
use super::normalize_profile_id;
use crate::data::{ProfileStore, Tab, TabStore};

/// URL prefixes of pages that are never stored.
pub const BLOCKED_URL_PREFIXES: &[&str] = &["chrome://", "file://", "chrome-extension://"];

/// A tab as reported by the extension. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportedTab {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A profile push from the extension: its identity plus its full tab set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tabs: Vec<ReportedTab>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TabSyncOutcome {
    /// Tabs deleted from the previous set
    pub removed: usize,
    /// Tabs inserted from the reported set
    pub inserted: usize,
    /// Reported tabs dropped by filtering or as duplicates
    pub skipped: usize,
}

/// Whether a reported tab has all fields and a storable URL.
pub fn is_storable(tab: &ReportedTab) -> bool {
    let (Some(_), Some(title), Some(url)) = (tab.id, tab.title.as_deref(), tab.url.as_deref())
    else {
        return false;
    };
    !title.is_empty()
        && !url.is_empty()
        && !BLOCKED_URL_PREFIXES
            .iter()
            .any(|prefix| url.starts_with(prefix))
}

/// Convert the storable reported tabs into rows for `profile_id`.
pub fn storable_tabs(profile_id: &str, reported: &[ReportedTab]) -> Vec<Tab> {
    reported
        .iter()
        .filter(|tab| is_storable(tab))
        .filter_map(|tab| {
            Some(Tab {
                profile_id: profile_id.to_string(),
                tab_id: tab.id?,
                title: tab.title.clone()?,
                url: tab.url.clone()?,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct TabSynchronizer {
    profiles: ProfileStore,
    tabs: TabStore,
}

impl TabSynchronizer {
    pub fn new(profiles: ProfileStore, tabs: TabStore) -> Self {
        Self { profiles, tabs }
    }

    /// Replace the stored tab set of a profile with `reported`.
    ///
    /// The prior set is deleted before anything is inserted. A storage failure
    /// part way through leaves the profile with a partial set.
    pub fn replace_tabs(
        &self,
        profile_id: &str,
        reported: &[ReportedTab],
    ) -> Result<TabSyncOutcome, EngineError> {
        let profile_id = normalize_profile_id(profile_id);
        if profile_id.is_empty() {
            return Err(EngineError::Validation("Missing profileId".to_string()));
        }
        if self.profiles.get_by_id(&profile_id)?.is_none() {
            return Err(EngineError::NotFound(format!(
                "Profile {} not found",
                profile_id
            )));
        }

        let removed = self.tabs.delete_for_profile(&profile_id)?;
        debug!(profile_id = %profile_id, removed, "Deleted tabs");

        let rows = storable_tabs(&profile_id, reported);
        let mut inserted = 0;
        for tab in &rows {
            if self.tabs.insert_or_ignore(tab)? {
                inserted += 1;
            }
        }

        let outcome = TabSyncOutcome {
            removed,
            inserted,
            skipped: reported.len() - inserted,
        };
        info!(
            profile_id = %profile_id,
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            "Replaced tabs"
        );
        Ok(outcome)
    }

    /// Record a profile push: upsert the profile's name and user id, then
    /// replace its tabs.
    pub fn sync_profile(&self, report: &ProfileReport) -> Result<TabSyncOutcome, EngineError> {
        let profile_id = report
            .profile_id
            .as_deref()
            .map(normalize_profile_id)
            .unwrap_or_default();
        let profile_name = report.profile_name.as_deref().unwrap_or_default();
        if profile_id.is_empty() || profile_name.is_empty() {
            return Err(EngineError::Validation(
                "Missing profileId or profileName".to_string(),
            ));
        }

        let user_id = report
            .user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&profile_id);
        self.profiles
            .upsert_reported(&profile_id, profile_name, user_id)?;

        self.replace_tabs(&profile_id, &report.tabs)
    }
}
