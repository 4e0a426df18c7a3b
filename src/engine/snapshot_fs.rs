//! Filesystem checks for snapshot files.
//!
//! The filesystem is the authority on whether a saved page still exists. A missing
//! file is reported as [`FileState::Missing`] / [`Removal::AlreadyAbsent`], never as
//! an error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

const FILE_URL_PREFIX: &str = "file://";

/// Result of probing a snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Present,
    Missing,
    /// The probe failed for another reason (permissions, I/O error, ...)
    Unreadable(String),
}

/// Result of removing a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyAbsent,
}

/// Probe whether a file exists.
pub async fn probe(path: &Path) -> FileState {
    match fs::metadata(path).await {
        Ok(_) => FileState::Present,
        Err(e) if e.kind() == ErrorKind::NotFound => FileState::Missing,
        Err(e) => FileState::Unreadable(e.to_string()),
    }
}

/// Remove a file, treating an absent file as already removed.
pub async fn remove(path: &Path) -> std::io::Result<Removal> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(Removal::Removed),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::AlreadyAbsent),
        Err(e) => Err(e),
    }
}

/// Regular files directly inside `dir`, sorted by path. A missing directory
/// has no files.
pub async fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Write `bytes` to a new file in `dir` named `<stem>.<extension>`, adding a
/// `-<n>` suffix to the stem while the name is taken. Returns the path written.
pub async fn write_new(
    dir: &Path,
    stem: &str,
    extension: &str,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{stem}.{extension}")
        } else {
            format!("{stem}-{attempt}.{extension}")
        };
        let path = dir.join(name);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// `file://` URL for a local path, with forward slashes.
pub fn file_url(path: &Path) -> String {
    format!("{FILE_URL_PREFIX}{}", path_key(path))
}

/// Local path referenced by a stored `file://` URL. Values without the
/// prefix are taken as plain paths.
pub fn path_from_file_url(url: &str) -> PathBuf {
    PathBuf::from(url.strip_prefix(FILE_URL_PREFIX).unwrap_or(url))
}

/// Comparison key for a path: its string form with forward slashes.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
