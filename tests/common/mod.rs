//! Shared test utilities for tabstash
//!
//! Provides a throwaway environment: a temporary data directory with a
//! database, a fake browser user data directory and a snapshot directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tabstash::{CompanionCore, Config, Database};
use tempfile::TempDir;

/// A temporary tabstash environment
///
/// Everything lives under one `TempDir` and is removed when the fixture drops.
pub struct TestEnv {
    /// TempDir handle (keeps directory alive until dropped)
    _dir: TempDir,
    /// Root of the temporary tree
    pub root: PathBuf,
    /// Fake browser user data directory (holds "Local State")
    pub browser_dir: PathBuf,
    /// Default snapshot directory
    pub snapshot_dir: PathBuf,
}

impl TestEnv {
    /// Create an environment whose browser reports the given profiles
    /// (`directory -> display name`).
    pub fn with_profiles(profiles: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path().to_path_buf();
        let browser_dir = root.join("chrome");
        std::fs::create_dir_all(&browser_dir).unwrap();

        let env = Self {
            _dir: dir,
            snapshot_dir: root.join("SavedPages"),
            browser_dir,
            root,
        };
        env.write_local_state(profiles);
        env
    }

    /// Rewrite the fake Local State file.
    pub fn write_local_state(&self, profiles: &[(&str, &str)]) {
        let info_cache: serde_json::Map<String, Value> = profiles
            .iter()
            .map(|(dir, name)| (dir.to_string(), json!({ "name": name })))
            .collect();
        let doc = json!({ "profile": { "info_cache": info_cache } });
        std::fs::write(self.local_state_path(), doc.to_string()).unwrap();
    }

    pub fn local_state_path(&self) -> PathBuf {
        self.browser_dir.join("Local State")
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join("tabstash.db")
    }

    pub fn config(&self) -> Config {
        Config::default()
            .with_browser_user_data_dir(self.browser_dir.clone())
            .with_default_snapshot_dir(self.snapshot_dir.clone())
    }

    /// Open a core on this environment's database.
    pub fn core(&self) -> CompanionCore {
        let db = Database::open(self.database_path()).expect("Failed to open database");
        CompanionCore::with_database(self.config(), db)
    }

    /// Drop a file into the snapshot directory without recording it.
    pub fn write_stray_snapshot(&self, name: &str) -> PathBuf {
        std::fs::create_dir_all(&self.snapshot_dir).unwrap();
        let path = self.snapshot_dir.join(name);
        std::fs::write(&path, b"stray").unwrap();
        path
    }
}

/// Local path of a stored `file://` URL
pub fn local_path(file_url: &str) -> &Path {
    Path::new(file_url.strip_prefix("file://").unwrap_or(file_url))
}

/// Encode a native messaging frame.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

/// Decode every frame in `bytes` as JSON.
pub fn decode_frames(mut bytes: &[u8]) -> Vec<Value> {
    let mut values = Vec::new();
    while bytes.len() >= 4 {
        let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let payload = &bytes[4..4 + len];
        values.push(serde_json::from_slice(payload).expect("Frame is not JSON"));
        bytes = &bytes[4 + len..];
    }
    assert!(bytes.is_empty(), "Trailing bytes after last frame");
    values
}
