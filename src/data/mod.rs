//! Data persistence layer for tabstash
//!
//! This module provides SQLite-based storage for profiles, tabs, saved pages
//! and settings.

mod database;
mod migrations;
mod models;
mod profile;
mod saved_page;
mod settings;
mod tab;

pub use database::{Database, DatabaseError};
pub use models::{NewSavedPage, Profile, SavedPage, Tab, UNKNOWN_USER};
pub use profile::ProfileStore;
pub use saved_page::SavedPageStore;
pub use settings::{SettingsStore, SNAPSHOT_DIR_KEY};
pub use tab::TabStore;
