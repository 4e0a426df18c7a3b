//! Saved page lifecycle.
//!
//! Records in `saved_pages` point at snapshot files on disk. Listing heals the
//! record set against the snapshot directory: records whose file vanished are
//! pruned and files nobody recorded are surfaced as orphans.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::error::EngineError;
use super::normalize_profile_id;
use super::snapshot_fs::{self, FileState, Removal};
use crate::data::{NewSavedPage, SavedPage, SavedPageStore, SettingsStore, SNAPSHOT_DIR_KEY};

/// Prefix of the synthetic id given to orphan files.
pub const ORPHAN_ID_PREFIX: &str = "orphan-";

const SNAPSHOT_EXTENSION: &str = "mhtml";

/// Identifier of a listed page: a record id or a synthetic orphan id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageId {
    Row(i64),
    Orphan(String),
}

/// One entry of the saved page listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPageEntry {
    pub id: PageId,
    pub url: Option<String>,
    pub file_name: String,
    pub title: String,
    pub timestamp: Option<String>,
    pub file_path: String,
    pub profile_id: Option<String>,
    pub is_orphan: bool,
}

impl SavedPageEntry {
    fn orphan(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: PageId::Orphan(format!("{ORPHAN_ID_PREFIX}{file_name}")),
            url: None,
            title: file_name.clone(),
            file_name,
            timestamp: None,
            file_path: snapshot_fs::file_url(path),
            profile_id: None,
            is_orphan: true,
        }
    }
}

impl From<SavedPage> for SavedPageEntry {
    fn from(page: SavedPage) -> Self {
        Self {
            id: PageId::Row(page.id),
            url: Some(page.url),
            file_name: page.file_name,
            title: page.title,
            timestamp: Some(page.timestamp),
            file_path: page.file_path,
            profile_id: page.profile_id,
            is_orphan: false,
        }
    }
}

/// Records partitioned by the state of their file, plus unrecorded files.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Records whose file exists
    pub valid: Vec<SavedPage>,
    /// Records whose file is missing
    pub stale: Vec<SavedPage>,
    /// Records whose file could not be probed, with the probe error
    pub unreadable: Vec<(SavedPage, String)>,
    /// Listed files referenced by no valid or unreadable record
    pub orphans: Vec<PathBuf>,
}

/// Reconcile probed records against a directory listing.
///
/// Records keep their input order. Orphans keep listing order.
pub fn diff(known: Vec<(SavedPage, FileState)>, listing: &[PathBuf]) -> SnapshotDiff {
    let mut result = SnapshotDiff::default();
    let mut referenced = HashSet::new();

    for (page, state) in known {
        match state {
            FileState::Present => {
                referenced.insert(record_key(&page));
                result.valid.push(page);
            }
            FileState::Missing => result.stale.push(page),
            FileState::Unreadable(reason) => {
                referenced.insert(record_key(&page));
                result.unreadable.push((page, reason));
            }
        }
    }

    result.orphans = listing
        .iter()
        .filter(|path| !referenced.contains(&snapshot_fs::path_key(path)))
        .cloned()
        .collect();
    result
}

fn record_key(page: &SavedPage) -> String {
    snapshot_fs::path_key(&snapshot_fs::path_from_file_url(&page.file_path))
}

/// What a delete request refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A recorded page
    Id(i64),
    /// An unrecorded file in the snapshot directory, by file name
    Orphan(String),
    /// A literal stored `file_path` (or plain path)
    FilePath(String),
}

impl DeleteTarget {
    /// Build a target from request fields. The id wins over the file path.
    pub fn from_request(id: Option<&str>, file_path: Option<&str>) -> Result<Self, EngineError> {
        if let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) {
            if let Some(name) = id.strip_prefix(ORPHAN_ID_PREFIX) {
                return Ok(DeleteTarget::Orphan(name.to_string()));
            }
            return id
                .parse()
                .map(DeleteTarget::Id)
                .map_err(|_| EngineError::Validation(format!("Invalid saved page id: {id}")));
        }
        match file_path.filter(|path| !path.is_empty()) {
            Some(path) => Ok(DeleteTarget::FilePath(path.to_string())),
            None => Err(EngineError::Validation("Missing id or filePath".to_string())),
        }
    }
}

/// Result of a delete. Deleting something already gone is still a success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// `None` when no file was resolved for the target
    pub file: Option<Removal>,
    pub record_removed: bool,
}

#[derive(Clone)]
pub struct SavedPageManager {
    pages: SavedPageStore,
    settings: SettingsStore,
    default_dir: PathBuf,
}

impl SavedPageManager {
    pub fn new(pages: SavedPageStore, settings: SettingsStore, default_dir: PathBuf) -> Self {
        Self {
            pages,
            settings,
            default_dir,
        }
    }

    /// Directory holding snapshot files: the `snapshot_dir` setting, else the default.
    pub fn snapshot_dir(&self) -> Result<PathBuf, EngineError> {
        let configured = self
            .settings
            .get(SNAPSHOT_DIR_KEY)?
            .filter(|dir| !dir.trim().is_empty());
        Ok(configured
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_dir.clone()))
    }

    /// Write a snapshot file and record it.
    ///
    /// The file is written before the row is inserted. If the insert fails the
    /// file stays behind and is listed as an orphan.
    pub async fn create(
        &self,
        url: &str,
        title: &str,
        content: &[u8],
        profile_id: &str,
    ) -> Result<SavedPage, EngineError> {
        let profile_id = normalize_profile_id(profile_id);
        if url.is_empty() || title.is_empty() || content.is_empty() || profile_id.is_empty() {
            return Err(EngineError::Validation(
                "Missing url, title, content or profileId".to_string(),
            ));
        }

        let dir = self.snapshot_dir()?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| EngineError::filesystem(&dir, e))?;

        let now = Utc::now();
        let stem = format!("saved_page_{}", now.timestamp_millis());
        let path = snapshot_fs::write_new(&dir, &stem, SNAPSHOT_EXTENSION, content)
            .await
            .map_err(|e| EngineError::filesystem(dir.join(&stem), e))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(stem);

        let page = self.pages.insert(NewSavedPage {
            url: url.to_string(),
            file_name,
            title: title.to_string(),
            timestamp: now.to_rfc3339(),
            file_path: snapshot_fs::file_url(&path),
            profile_id: Some(profile_id),
        })?;
        info!(id = page.id, url = %page.url, path = %path.display(), "Saved page");
        Ok(page)
    }

    /// List saved pages whose files exist, followed by orphan files.
    ///
    /// Records whose file is missing are deleted as a side effect.
    pub async fn list(&self) -> Result<Vec<SavedPageEntry>, EngineError> {
        let dir = self.snapshot_dir()?;
        let listing = snapshot_fs::list_files(&dir)
            .await
            .map_err(|e| EngineError::filesystem(&dir, e))?;

        let pages = self.pages.get_all()?;
        let mut known = Vec::with_capacity(pages.len());
        for page in pages {
            let state = snapshot_fs::probe(&snapshot_fs::path_from_file_url(&page.file_path)).await;
            known.push((page, state));
        }

        let diff = diff(known, &listing);
        for page in &diff.stale {
            warn!(id = page.id, file_path = %page.file_path, "File not found for saved page");
            match self.pages.delete(page.id) {
                Ok(_) => info!(id = page.id, "Deleted stale saved page"),
                Err(e) => error!(id = page.id, error = %e, "Error deleting stale saved page"),
            }
        }
        for (page, reason) in &diff.unreadable {
            error!(id = page.id, file_path = %page.file_path, error = %reason, "Error checking saved page file");
        }
        debug!(
            valid = diff.valid.len(),
            stale = diff.stale.len(),
            orphans = diff.orphans.len(),
            "Listed saved pages"
        );

        let orphans = diff.orphans.iter().map(|path| SavedPageEntry::orphan(path));
        Ok(diff
            .valid
            .into_iter()
            .map(SavedPageEntry::from)
            .chain(orphans)
            .collect())
    }

    /// Delete a saved page and its file. Idempotent: unknown targets and
    /// missing files succeed.
    pub async fn delete(&self, target: &DeleteTarget) -> Result<DeleteOutcome, EngineError> {
        match target {
            DeleteTarget::Id(id) => match self.pages.get_by_id(*id)? {
                Some(page) => self.delete_page(&page).await,
                None => {
                    debug!(id, "Saved page already deleted");
                    Ok(DeleteOutcome::default())
                }
            },
            DeleteTarget::Orphan(name) => {
                if !is_plain_file_name(name) {
                    return Err(EngineError::Validation(format!(
                        "Invalid orphan file name: {name}"
                    )));
                }
                let path = self.snapshot_dir()?.join(name);
                self.delete_file_and_record(&path, &snapshot_fs::file_url(&path))
                    .await
            }
            DeleteTarget::FilePath(file_path) => {
                if let Some(page) = self.pages.get_by_file_path(file_path)? {
                    return self.delete_page(&page).await;
                }
                let path = snapshot_fs::path_from_file_url(file_path);
                let dir = self.snapshot_dir()?;
                if path.parent().map(snapshot_fs::path_key) != Some(snapshot_fs::path_key(&dir)) {
                    warn!(file_path = %file_path, "Refusing to delete file outside the snapshot directory");
                    return Ok(DeleteOutcome::default());
                }
                self.delete_file_and_record(&path, &snapshot_fs::file_url(&path))
                    .await
            }
        }
    }

    /// Delete every saved page owned by a profile along with its file.
    /// Must run while the profile's tabs still exist. Returns the number of
    /// records removed.
    pub async fn delete_for_profile(&self, profile_id: &str) -> Result<usize, EngineError> {
        let pages = self.pages.get_for_profile(profile_id)?;
        let mut removed = 0;
        for page in &pages {
            if self.delete_page(page).await?.record_removed {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn delete_page(&self, page: &SavedPage) -> Result<DeleteOutcome, EngineError> {
        let path = snapshot_fs::path_from_file_url(&page.file_path);
        let file = self.remove_file(&path).await?;
        let record_removed = self.pages.delete(page.id)?;
        info!(id = page.id, ?file, "Deleted saved page");
        Ok(DeleteOutcome {
            file: Some(file),
            record_removed,
        })
    }

    async fn delete_file_and_record(
        &self,
        path: &Path,
        file_path: &str,
    ) -> Result<DeleteOutcome, EngineError> {
        let file = self.remove_file(path).await?;
        let record_removed = match self.pages.get_by_file_path(file_path)? {
            Some(page) => self.pages.delete(page.id)?,
            None => false,
        };
        info!(path = %path.display(), ?file, record_removed, "Deleted snapshot file");
        Ok(DeleteOutcome {
            file: Some(file),
            record_removed,
        })
    }

    async fn remove_file(&self, path: &Path) -> Result<Removal, EngineError> {
        let removal = snapshot_fs::remove(path)
            .await
            .map_err(|e| EngineError::filesystem(path, e))?;
        if removal == Removal::AlreadyAbsent {
            warn!(path = %path.display(), "File not found, skipping deletion");
        }
        Ok(removal)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Database;
    use proptest::prelude::*;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        snapshots: PathBuf,
        pages: SavedPageStore,
        manager: SavedPageManager,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).unwrap();
        let snapshots = dir.path().join("SavedPages");
        let pages = SavedPageStore::new(db.connection());
        let manager = SavedPageManager::new(
            pages.clone(),
            SettingsStore::new(db.connection()),
            snapshots.clone(),
        );
        Fixture {
            _dir: dir,
            snapshots,
            pages,
            manager,
        }
    }

    fn page(id: i64, path: &str) -> SavedPage {
        SavedPage {
            id,
            url: format!("https://example.com/{id}"),
            file_name: path.rsplit('/').next().unwrap().to_string(),
            title: "t".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            file_path: format!("file://{path}"),
            profile_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_writes_file_and_record() {
        let f = fixture();
        let page = f
            .manager
            .create("https://example.com", "Example", b"MHTML", "PROFILE")
            .await
            .unwrap();

        assert!(page.file_name.starts_with("saved_page_"));
        assert!(page.file_name.ends_with(".mhtml"));
        assert_eq!(page.profile_id.as_deref(), Some("profile"));
        let path = snapshot_fs::path_from_file_url(&page.file_path);
        assert_eq!(std::fs::read(path).unwrap(), b"MHTML");
        assert_eq!(f.pages.get_all().unwrap(), vec![page]);
    }

    #[tokio::test]
    async fn test_create_requires_all_fields() {
        let f = fixture();
        let result = f.manager.create("https://example.com", "", b"x", "p").await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
        let result = f.manager.create("https://example.com", "t", b"", "p").await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert!(!f.snapshots.exists());
    }

    #[tokio::test]
    async fn test_create_into_unwritable_location_adds_no_record() {
        let f = fixture();
        let blocker = f.snapshots.parent().unwrap().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        f.manager
            .settings
            .set(SNAPSHOT_DIR_KEY, &blocker.join("dir").to_string_lossy())
            .unwrap();

        let result = f.manager.create("https://a", "A", b"x", "p").await;

        assert!(matches!(result, Err(EngineError::Filesystem { .. })));
        assert!(f.pages.get_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_prunes_stale_records() {
        let f = fixture();
        let kept = f.manager.create("https://a", "A", b"a", "p").await.unwrap();
        let gone = f.manager.create("https://b", "B", b"b", "p").await.unwrap();
        std::fs::remove_file(snapshot_fs::path_from_file_url(&gone.file_path)).unwrap();

        let listed = f.manager.list().await.unwrap();

        assert_eq!(listed, vec![SavedPageEntry::from(kept.clone())]);
        assert_eq!(f.pages.get_all().unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_list_appends_orphans() {
        let f = fixture();
        let page = f.manager.create("https://a", "A", b"a", "p").await.unwrap();
        std::fs::write(f.snapshots.join("stray.mhtml"), b"x").unwrap();

        let listed = f.manager.list().await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, PageId::Row(page.id));
        let orphan = &listed[1];
        assert!(orphan.is_orphan);
        assert_eq!(orphan.id, PageId::Orphan("orphan-stray.mhtml".to_string()));
        assert_eq!(orphan.url, None);
        assert_eq!(orphan.timestamp, None);
    }

    #[tokio::test]
    async fn test_list_without_directory_is_empty() {
        let f = fixture();
        assert!(f.manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds() {
        let f = fixture();
        let page = f.manager.create("https://a", "A", b"a", "p").await.unwrap();
        let target = DeleteTarget::Id(page.id);

        let first = f.manager.delete(&target).await.unwrap();
        assert_eq!(first.file, Some(Removal::Removed));
        assert!(first.record_removed);

        let second = f.manager.delete(&target).await.unwrap();
        assert_eq!(second, DeleteOutcome::default());
        assert!(f.manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_missing_file_removes_record() {
        let f = fixture();
        let page = f.manager.create("https://a", "A", b"a", "p").await.unwrap();
        std::fs::remove_file(snapshot_fs::path_from_file_url(&page.file_path)).unwrap();

        let outcome = f.manager.delete(&DeleteTarget::Id(page.id)).await.unwrap();

        assert_eq!(outcome.file, Some(Removal::AlreadyAbsent));
        assert!(outcome.record_removed);
    }

    #[tokio::test]
    async fn test_delete_by_file_path_and_orphan() {
        let f = fixture();
        let page = f.manager.create("https://a", "A", b"a", "p").await.unwrap();
        std::fs::write(f.snapshots.join("stray.mhtml"), b"x").unwrap();

        let outcome = f
            .manager
            .delete(&DeleteTarget::FilePath(page.file_path.clone()))
            .await
            .unwrap();
        assert!(outcome.record_removed);

        let outcome = f
            .manager
            .delete(&DeleteTarget::Orphan("stray.mhtml".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome.file, Some(Removal::Removed));
        assert!(!f.snapshots.join("stray.mhtml").exists());
    }

    #[tokio::test]
    async fn test_delete_rejects_paths_outside_snapshot_dir() {
        let f = fixture();
        let outside = f.snapshots.parent().unwrap().join("keep.txt");
        std::fs::write(&outside, b"x").unwrap();

        let outcome = f
            .manager
            .delete(&DeleteTarget::FilePath(outside.to_string_lossy().into_owned()))
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::default());
        assert!(outside.exists());

        let result = f
            .manager
            .delete(&DeleteTarget::Orphan("../keep.txt".to_string()))
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert!(outside.exists());
    }

    #[tokio::test]
    async fn test_snapshot_dir_setting() {
        let f = fixture();
        assert_eq!(f.manager.snapshot_dir().unwrap(), f.snapshots);

        let custom = f.snapshots.parent().unwrap().join("custom");
        f.manager
            .settings
            .set(SNAPSHOT_DIR_KEY, &custom.to_string_lossy())
            .unwrap();
        let page = f.manager.create("https://a", "A", b"a", "p").await.unwrap();

        assert_eq!(f.manager.snapshot_dir().unwrap(), custom);
        assert!(snapshot_fs::path_from_file_url(&page.file_path).starts_with(&custom));
    }

    #[test]
    fn test_delete_target_from_request() {
        assert_eq!(
            DeleteTarget::from_request(Some("12"), Some("file:///x")).unwrap(),
            DeleteTarget::Id(12)
        );
        assert_eq!(
            DeleteTarget::from_request(Some("orphan-a.mhtml"), None).unwrap(),
            DeleteTarget::Orphan("a.mhtml".to_string())
        );
        assert_eq!(
            DeleteTarget::from_request(None, Some("file:///x")).unwrap(),
            DeleteTarget::FilePath("file:///x".to_string())
        );
        assert!(DeleteTarget::from_request(Some("abc"), None).is_err());
        assert!(DeleteTarget::from_request(None, None).is_err());
    }

    #[test]
    fn test_diff_partitions_records() {
        let known = vec![
            (page(1, "/s/a.mhtml"), FileState::Present),
            (page(2, "/s/b.mhtml"), FileState::Missing),
            (page(3, "/s/c.mhtml"), FileState::Unreadable("denied".to_string())),
        ];
        let listing = vec![
            PathBuf::from("/s/a.mhtml"),
            PathBuf::from("/s/c.mhtml"),
            PathBuf::from("/s/d.mhtml"),
        ];

        let diff = diff(known, &listing);

        assert_eq!(diff.valid, vec![page(1, "/s/a.mhtml")]);
        assert_eq!(diff.stale, vec![page(2, "/s/b.mhtml")]);
        assert_eq!(diff.unreadable.len(), 1);
        assert_eq!(diff.orphans, vec![PathBuf::from("/s/d.mhtml")]);
    }

    proptest! {
        #[test]
        fn diff_orphans_are_exactly_unreferenced_files(
            files in prop::collection::btree_set("[a-z]{1,8}", 0..12),
            recorded in prop::collection::vec(any::<bool>(), 12),
            present in prop::collection::vec(any::<bool>(), 12),
        ) {
            let files: Vec<String> = files.into_iter().collect();
            let mut known = Vec::new();
            let mut referenced = HashSet::new();
            for (i, name) in files.iter().enumerate() {
                if recorded[i] {
                    let path = format!("/s/{name}.mhtml");
                    let state = if present[i] { FileState::Present } else { FileState::Missing };
                    if present[i] {
                        referenced.insert(path.clone());
                    }
                    known.push((page(i as i64, &path), state));
                }
            }
            let listing: Vec<PathBuf> = files
                .iter()
                .map(|name| PathBuf::from(format!("/s/{name}.mhtml")))
                .collect();
            let total = known.len();

            let diff = diff(known, &listing);

            prop_assert_eq!(diff.valid.len() + diff.stale.len() + diff.unreadable.len(), total);
            for orphan in &diff.orphans {
                prop_assert!(!referenced.contains(&snapshot_fs::path_key(orphan)));
            }
            prop_assert_eq!(diff.orphans.len(), listing.len() - referenced.len());
        }
    }
}
