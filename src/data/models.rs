//! Data models for profiles, tabs and saved pages

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback user id for profiles without a known account.
pub const UNKNOWN_USER: &str = "unknown";

/// A browser profile persisted by the companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Stable opaque identifier
    pub profile_id: String,
    /// Display name
    #[serde(rename = "profileName")]
    pub name: String,
    /// Browser profile directory (lower-cased join key), if known
    #[serde(rename = "profileDir")]
    pub directory: Option<String>,
    /// Best-effort external account identifier
    pub user_id: String,
    /// Hidden from the extension's profile list
    #[serde(rename = "isHidden")]
    pub hidden: bool,
}

impl Profile {
    /// Create a profile for a browser directory with a freshly minted id
    pub fn discovered(name: impl Into<String>, directory: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            profile_id: Uuid::new_v4().to_string(),
            name: name.into(),
            directory: Some(directory.into()),
            user_id: user_id.into(),
            hidden: false,
        }
    }
}

/// A tab open in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub profile_id: String,
    /// Browser-assigned tab id
    #[serde(rename = "id")]
    pub tab_id: i64,
    pub title: String,
    pub url: String,
}

/// An archived page snapshot with its backing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPage {
    pub id: i64,
    pub url: String,
    pub file_name: String,
    pub title: String,
    /// RFC 3339 creation instant
    pub timestamp: String,
    /// `file://`-prefixed absolute path
    pub file_path: String,
    pub profile_id: Option<String>,
}

/// A saved page that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSavedPage {
    pub url: String,
    pub file_name: String,
    pub title: String,
    pub timestamp: String,
    pub file_path: String,
    pub profile_id: Option<String>,
}

impl NewSavedPage {
    pub fn into_saved(self, id: i64) -> SavedPage {
        SavedPage {
            id,
            url: self.url,
            file_name: self.file_name,
            title: self.title,
            timestamp: self.timestamp,
            file_path: self.file_path,
            profile_id: self.profile_id,
        }
    }
}
