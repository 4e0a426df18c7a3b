//! Reader for the browser's own profile registry ("Local State").

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Profile attributes reported by the browser for one profile directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    /// Account e-mail as Chrome writes it
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub gaia_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl ProfileInfo {
    /// Best-effort account id: gaia id, then user id, then e-mail.
    pub fn account_id(&self) -> Option<&str> {
        [&self.gaia_id, &self.user_id]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
            .or_else(|| self.email())
    }

    /// `user_email`, falling back to `user_name`.
    pub fn email(&self) -> Option<&str> {
        [&self.user_email, &self.user_name]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|v| !v.is_empty())
    }
}

/// Browser-reported profiles keyed by profile directory (original casing).
pub type ProfileInfoMap = BTreeMap<String, ProfileInfo>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct LocalState {
    #[serde(default)]
    profile: Option<LocalStateProfiles>,
}

#[derive(Deserialize)]
struct LocalStateProfiles {
    #[serde(default)]
    info_cache: ProfileInfoMap,
}

/// Parse the `profile.info_cache` section of a Local State document.
/// A document without that section lists no profiles.
pub fn parse_local_state(contents: &str) -> Result<ProfileInfoMap, serde_json::Error> {
    let state: LocalState = serde_json::from_str(contents)?;
    Ok(state.profile.map(|p| p.info_cache).unwrap_or_default())
}

/// Built-in mapping used when the Local State file cannot be read.
pub fn seed_profiles() -> ProfileInfoMap {
    let mut seed = ProfileInfoMap::new();
    seed.insert(
        "Default".to_string(),
        ProfileInfo {
            name: Some("Default".to_string()),
            ..ProfileInfo::default()
        },
    );
    seed
}

/// The Local State file of a browser installation.
#[derive(Debug, Clone)]
pub struct LocalStateSource {
    path: PathBuf,
}

impl LocalStateSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<ProfileInfoMap, SourceError> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| SourceError::Read {
                    path: self.path.clone(),
                    source,
                })?;
        parse_local_state(&contents).map_err(|source| SourceError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}
