//! Integration tests for the saved page lifecycle
//!
//! Tests that listing heals the record set against the snapshot directory
//! and that deletes are idempotent.

use super::common::{local_path, TestEnv};
use tabstash::engine::{DeleteTarget, PageId, ReportedTab};

/// Test create, external delete, then list
#[tokio::test]
async fn test_missing_file_prunes_record() {
    let env = TestEnv::with_profiles(&[("Default", "Personal")]);
    let core = env.core();

    let page = core
        .create_saved_page("https://a", "A", b"MHTML", "p")
        .await
        .unwrap();
    std::fs::remove_file(local_path(&page.file_path)).unwrap();

    assert!(core.list_saved_pages().await.unwrap().is_empty());
    // The record is gone, so a second listing has nothing to prune either
    assert!(core.list_saved_pages().await.unwrap().is_empty());
}

/// Test that a stray file shows up as an orphan and can be deleted by its id
#[tokio::test]
async fn test_orphan_listed_and_deleted() {
    let env = TestEnv::with_profiles(&[]);
    let core = env.core();
    let stray = env.write_stray_snapshot("manual.mhtml");

    let listed = core.list_saved_pages().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].is_orphan);
    let PageId::Orphan(id) = &listed[0].id else {
        panic!("Expected an orphan id");
    };
    assert_eq!(id, "orphan-manual.mhtml");

    let target = DeleteTarget::from_request(Some(id), None).unwrap();
    core.delete_saved_page(&target).await.unwrap();

    assert!(!stray.exists());
    assert!(core.list_saved_pages().await.unwrap().is_empty());
}

/// Test that deleting by id twice succeeds both times
#[tokio::test]
async fn test_delete_is_idempotent() {
    let env = TestEnv::with_profiles(&[]);
    let core = env.core();
    let page = core
        .create_saved_page("https://a", "A", b"MHTML", "p")
        .await
        .unwrap();

    let target = DeleteTarget::Id(page.id);
    core.delete_saved_page(&target).await.unwrap();
    core.delete_saved_page(&target).await.unwrap();

    assert!(!local_path(&page.file_path).exists());
}

/// Test that the snapshot_dir setting redirects new snapshots and listings
#[tokio::test]
async fn test_snapshot_dir_setting_moves_storage() {
    let env = TestEnv::with_profiles(&[]);
    let core = env.core();
    let custom = env.root.join("archive");
    core.set_setting("snapshot_dir", &custom.to_string_lossy())
        .unwrap();

    let page = core
        .create_saved_page("https://a", "A", b"MHTML", "p")
        .await
        .unwrap();
    env.write_stray_snapshot("old.mhtml");

    assert!(local_path(&page.file_path).starts_with(&custom));
    let listed = core.list_saved_pages().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].is_orphan);
}

/// Test that deleting a profile removes the snapshots saved from its tabs
#[tokio::test]
async fn test_profile_delete_removes_its_snapshots() {
    let env = TestEnv::with_profiles(&[("Default", "Personal"), ("Profile 1", "Work")]);
    let core = env.core();
    let mapping = core.resolve_profiles(false).await;
    let personal = mapping["default"].profile_id.clone();
    let work = mapping["profile 1"].profile_id.clone();
    core.replace_tabs(
        &work,
        &[ReportedTab {
            id: Some(1),
            title: Some("Shared".to_string()),
            url: Some("https://shared".to_string()),
        }],
    )
    .unwrap();

    // Saved from the personal profile, but the url is open in the work profile
    let by_url = core
        .create_saved_page("https://shared", "S", b"1", &personal)
        .await
        .unwrap();
    let unrelated = core
        .create_saved_page("https://other", "O", b"2", &personal)
        .await
        .unwrap();

    core.delete_profile(&work).await.unwrap();

    assert!(!local_path(&by_url.file_path).exists());
    assert!(local_path(&unrelated.file_path).exists());
    let listed = core.list_saved_pages().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, PageId::Row(unrelated.id));
}
