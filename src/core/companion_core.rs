//! Engine facade shared by the HTTP adapter and the native messaging channel.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::dto::{ProfileOverview, TabOverview};
use crate::config::Config;
use crate::data::{
    Database, DatabaseError, ProfileStore, SavedPage, SavedPageStore, SettingsStore, TabStore,
};
use crate::engine::{
    normalize_profile_id, DeleteOutcome, DeleteTarget, EngineError, LocalStateSource, ProfileMap,
    ProfileReconciler, ProfileReport, ReportedTab, SavedPageEntry, SavedPageManager,
    TabSyncOutcome, TabSynchronizer,
};

/// Name reported for profile ids the reconciler does not know.
pub const UNKNOWN_PROFILE_NAME: &str = "Unknown Profile";

/// Owns the database, the stores and the engine components built on them.
pub struct CompanionCore {
    /// Application configuration
    config: Config,
    /// Database handle (owned to keep the connection alive)
    database: Database,
    profiles: ProfileStore,
    tabs: TabStore,
    settings: SettingsStore,
    reconciler: ProfileReconciler,
    tab_sync: TabSynchronizer,
    saved_pages: SavedPageManager,
}

impl CompanionCore {
    /// Open the default database and build the engine on it.
    pub fn open(config: Config) -> Result<Self, DatabaseError> {
        let database = Database::open_default()?;
        Ok(Self::with_database(config, database))
    }

    /// Build the engine on an already opened database.
    pub fn with_database(config: Config, database: Database) -> Self {
        let profiles = ProfileStore::new(database.connection());
        let tabs = TabStore::new(database.connection());
        let settings = SettingsStore::new(database.connection());
        let pages = SavedPageStore::new(database.connection());

        let reconciler = ProfileReconciler::new(
            profiles.clone(),
            LocalStateSource::new(config.local_state_path()),
            config.profile_cache_ttl,
        );
        let tab_sync = TabSynchronizer::new(profiles.clone(), tabs.clone());
        let saved_pages =
            SavedPageManager::new(pages, settings.clone(), config.default_snapshot_dir.clone());

        Self {
            config,
            database,
            profiles,
            tabs,
            settings,
            reconciler,
            tab_sync,
            saved_pages,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get a clone of the profile store.
    pub fn profile_store_clone(&self) -> ProfileStore {
        self.profiles.clone()
    }

    pub fn reconciler(&self) -> &ProfileReconciler {
        &self.reconciler
    }

    pub fn saved_pages(&self) -> &SavedPageManager {
        &self.saved_pages
    }

    pub async fn resolve_profiles(&self, force_refresh: bool) -> Arc<ProfileMap> {
        self.reconciler.resolve_profiles(force_refresh).await
    }

    /// Display name of a profile from the resolved mapping.
    pub async fn profile_name(&self, profile_id: &str) -> Result<String, EngineError> {
        let profile_id = normalize_profile_id(profile_id);
        if profile_id.is_empty() {
            return Err(EngineError::Validation("Missing profileId".to_string()));
        }
        let mapping = self.resolve_profiles(false).await;
        Ok(mapping
            .values()
            .find(|view| view.profile_id == profile_id)
            .map(|view| view.name.clone())
            .unwrap_or_else(|| UNKNOWN_PROFILE_NAME.to_string()))
    }

    /// Every stored profile with its display name, current flag and tabs.
    /// Tabs carry the saved pages whose url equals the tab url.
    pub async fn profile_overview(
        &self,
        current_profile_id: Option<&str>,
        force_refresh: bool,
    ) -> Result<Vec<ProfileOverview>, EngineError> {
        let mapping = self.resolve_profiles(force_refresh).await;
        let current = current_profile_id
            .map(normalize_profile_id)
            .filter(|id| !id.is_empty());

        let profiles = self.profiles.get_all()?;
        let tabs = self.tabs.get_all()?;
        let saved = self.saved_pages.list().await?;

        let mut versions_by_url: HashMap<&str, Vec<&SavedPageEntry>> = HashMap::new();
        for entry in &saved {
            if let Some(url) = entry.url.as_deref() {
                versions_by_url.entry(url).or_default().push(entry);
            }
        }

        let mut tabs_by_profile: HashMap<String, Vec<TabOverview>> = HashMap::new();
        for tab in tabs {
            let saved_versions = versions_by_url
                .get(tab.url.as_str())
                .map(|entries| entries.iter().map(|e| (*e).clone()).collect())
                .unwrap_or_default();
            tabs_by_profile
                .entry(tab.profile_id.to_lowercase())
                .or_default()
                .push(TabOverview {
                    id: tab.tab_id,
                    profile_id: tab.profile_id,
                    title: tab.title,
                    url: tab.url,
                    saved_versions,
                });
        }

        Ok(profiles
            .into_iter()
            .map(|profile| {
                let name = profile
                    .directory
                    .as_deref()
                    .and_then(|dir| mapping.get(&dir.to_lowercase()))
                    .map(|view| view.name.clone())
                    .filter(|name| !name.is_empty())
                    .or_else(|| Some(profile.name.clone()).filter(|name| !name.is_empty()))
                    .unwrap_or_else(|| {
                        format!("Profile {}", profile.directory.as_deref().unwrap_or_default())
                    });
                let is_current = current.as_deref() == Some(profile.profile_id.to_lowercase().as_str());
                let tabs = tabs_by_profile
                    .remove(&profile.profile_id.to_lowercase())
                    .unwrap_or_default();
                let mut overview = ProfileOverview::new(profile, name, is_current);
                overview.tabs = tabs;
                overview
            })
            .collect())
    }

    pub fn replace_tabs(
        &self,
        profile_id: &str,
        reported: &[ReportedTab],
    ) -> Result<TabSyncOutcome, EngineError> {
        self.tab_sync.replace_tabs(profile_id, reported)
    }

    pub fn sync_profile(&self, report: &ProfileReport) -> Result<TabSyncOutcome, EngineError> {
        self.tab_sync.sync_profile(report)
    }

    pub fn set_profile_hidden(&self, profile_id: &str, hidden: bool) -> Result<(), EngineError> {
        let profile_id = normalize_profile_id(profile_id);
        if !self.profiles.set_hidden(&profile_id, hidden)? {
            return Err(EngineError::NotFound(format!(
                "Profile {} not found",
                profile_id
            )));
        }
        info!(profile_id = %profile_id, hidden, "Updated profile visibility");
        Ok(())
    }

    /// Delete a profile with its tabs and its saved pages (files included),
    /// then invalidate the profile cache.
    pub async fn delete_profile(&self, profile_id: &str) -> Result<(), EngineError> {
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

        let pages = self.saved_pages.delete_for_profile(&profile_id).await?;
        self.profiles.delete_with_tabs(&profile_id)?;
        self.reconciler.invalidate();
        info!(profile_id = %profile_id, saved_pages = pages, "Deleted profile");
        Ok(())
    }

    pub async fn create_saved_page(
        &self,
        url: &str,
        title: &str,
        content: &[u8],
        profile_id: &str,
    ) -> Result<SavedPage, EngineError> {
        self.saved_pages.create(url, title, content, profile_id).await
    }

    pub async fn list_saved_pages(&self) -> Result<Vec<SavedPageEntry>, EngineError> {
        self.saved_pages.list().await
    }

    pub async fn delete_saved_page(
        &self,
        target: &DeleteTarget,
    ) -> Result<DeleteOutcome, EngineError> {
        self.saved_pages.delete(target).await
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self.settings.get(key)?)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), EngineError> {
        if key.is_empty() {
            return Err(EngineError::Validation("Missing setting key".to_string()));
        }
        self.settings.set(key, value)?;
        Ok(())
    }
}
