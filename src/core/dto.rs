//! Response shapes built from several stores at once.

use serde::Serialize;

use crate::data::Profile;
use crate::engine::SavedPageEntry;

/// A stored profile enriched for the extension's profile list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOverview {
    pub profile_id: String,
    pub profile_name: String,
    pub profile_dir: Option<String>,
    pub user_id: String,
    pub is_hidden: bool,
    pub is_current: bool,
    pub tabs: Vec<TabOverview>,
}

impl ProfileOverview {
    pub(crate) fn new(profile: Profile, profile_name: String, is_current: bool) -> Self {
        Self {
            profile_id: profile.profile_id,
            profile_name,
            profile_dir: profile.directory,
            user_id: profile.user_id,
            is_hidden: profile.hidden,
            is_current,
            tabs: Vec::new(),
        }
    }
}

/// A stored tab with the snapshots saved from its url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabOverview {
    pub id: i64,
    pub profile_id: String,
    pub title: String,
    pub url: String,
    pub saved_versions: Vec<SavedPageEntry>,
}
