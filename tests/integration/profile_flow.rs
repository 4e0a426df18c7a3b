//! Integration tests for profile reconciliation and tab sync
//!
//! Tests that browser-reported profiles, extension pushes and the durable
//! store agree across several calls.

use super::common::TestEnv;
use rusqlite::params;
use std::sync::Arc;
use tabstash::data::{ProfileStore, TabStore};
use tabstash::engine::{ProfileReport, ReportedTab};
use tabstash::{Database, EngineError, Profile};

fn tab(id: i64, url: &str) -> ReportedTab {
    ReportedTab {
        id: Some(id),
        title: Some(format!("Tab {id}")),
        url: Some(url.to_string()),
    }
}

/// Test that ids minted for browser directories survive a restart
#[tokio::test]
async fn test_profile_ids_are_stable_across_restarts() {
    let env = TestEnv::with_profiles(&[("Default", "Personal"), ("Profile 1", "Work")]);

    let first = env.core().resolve_profiles(false).await;
    let second = env.core().resolve_profiles(false).await;

    assert_eq!(first.len(), 2);
    for (dir, view) in first.iter() {
        assert_eq!(second[dir].profile_id, view.profile_id);
    }
}

/// Test that a cached mapping is reused until a forced refresh
#[tokio::test]
async fn test_cache_is_reused_until_forced() {
    let env = TestEnv::with_profiles(&[("Default", "Personal")]);
    let core = env.core();

    let first = core.resolve_profiles(false).await;
    env.write_local_state(&[("Default", "Personal"), ("Profile 7", "New")]);

    assert!(Arc::ptr_eq(&first, &core.resolve_profiles(false).await));
    let refreshed = core.resolve_profiles(true).await;
    assert_eq!(refreshed.len(), 2);
}

/// Test that directories differing only in case are collapsed to one profile
#[tokio::test]
async fn test_duplicate_directories_repaired_on_resolve() {
    let env = TestEnv::with_profiles(&[("Profile 1", "Work")]);
    let db = Database::open(env.database_path()).unwrap();
    let store = ProfileStore::new(db.connection());
    let keep = Profile::discovered("Work", "profile 1", "unknown");
    store.insert_or_ignore(&keep).unwrap();
    // The UNIQUE constraint is case-sensitive, so a differently cased copy slips in
    db.with_connection(|conn| {
        conn.execute(
            "INSERT INTO profiles (profile_id, profile_name, profile_dir, user_id)
             VALUES ('dup', 'Work', 'Profile 1', 'unknown')",
            [],
        )?;
        conn.execute(
            "INSERT INTO tabs (profile_id, tab_id, title, url) VALUES (?1, 1, 't', 'https://a')",
            params![keep.profile_id],
        )?;
        conn.execute(
            "INSERT INTO tabs (profile_id, tab_id, title, url) VALUES ('dup', 2, 't', 'https://b')",
            [],
        )
    })
    .unwrap();

    let core = env.core();
    let mapping = core.resolve_profiles(false).await;

    assert_eq!(mapping["profile 1"].profile_id, keep.profile_id);
    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    let tabs = TabStore::new(db.connection());
    assert_eq!(tabs.get_for_profile(&keep.profile_id).unwrap().len(), 1);
    assert!(tabs.get_for_profile("dup").unwrap().is_empty());
}

/// Test the extension's periodic push followed by a full tab close
#[tokio::test]
async fn test_profile_push_replaces_tab_set() {
    let env = TestEnv::with_profiles(&[("Default", "Personal")]);
    let core = env.core();
    let mapping = core.resolve_profiles(false).await;
    let id = mapping["default"].profile_id.clone();

    let report = ProfileReport {
        profile_id: Some(id.clone()),
        profile_name: Some("Personal".to_string()),
        user_id: None,
        tabs: vec![
            tab(1, "https://a"),
            tab(2, "chrome-extension://abc/popup.html"),
            tab(3, "file:///etc/hosts"),
        ],
    };
    let outcome = core.sync_profile(&report).unwrap();
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.skipped, 2);

    let outcome = core.replace_tabs(&id, &[]).unwrap();
    assert_eq!(outcome.removed, 1);
    let overview = core.profile_overview(Some(&id), false).await.unwrap();
    assert!(overview[0].is_current);
    assert!(overview[0].tabs.is_empty());
}

/// Test that tab sync for an unknown profile mutates nothing
#[tokio::test]
async fn test_replace_tabs_for_unknown_profile() {
    let env = TestEnv::with_profiles(&[]);
    let core = env.core();

    let result = core.replace_tabs("ghost", &[tab(1, "https://a")]);

    assert!(matches!(result, Err(EngineError::NotFound(_))));
}
