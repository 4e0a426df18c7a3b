//! Path utilities for tabstash data directories and browser locations

use std::path::PathBuf;
use std::sync::OnceLock;

/// Global storage for custom data directory path
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the data directory with an optional custom path.
/// Must be called early in main() before any other path functions are used.
/// If custom_path is None, uses the default ~/.tabstash location.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(default_data_dir);
    if DATA_DIR.set(path.clone()).is_err() {
        let existing = DATA_DIR
            .get()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::debug!(
            path = %path.display(),
            existing = %existing,
            "Data directory already initialized"
        );
    }
}

/// Get the default data directory path (~/.tabstash)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tabstash"))
        .unwrap_or_else(|| PathBuf::from(".tabstash"))
}

/// Get the base tabstash data directory.
/// Returns the custom path if set via init_data_dir(), otherwise ~/.tabstash
pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// Get the database file path (~/.tabstash/tabstash.db)
pub fn database_path() -> PathBuf {
    data_dir().join("tabstash.db")
}

/// Get the logs directory (~/.tabstash/logs)
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Get the default log file path (~/.tabstash/logs/tabstash.log)
pub fn log_file_path() -> PathBuf {
    logs_dir().join("tabstash.log")
}

/// Get the config file path (~/.tabstash/config.toml)
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Default directory for saved page snapshots (~/.tabstash/SavedPages)
pub fn default_snapshot_dir() -> PathBuf {
    data_dir().join("SavedPages")
}

/// Chrome's user data directory for the current platform.
pub fn browser_user_data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Google")
            .join("Chrome")
            .join("User Data")
    } else if cfg!(target_os = "macos") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library")
            .join("Application Support")
            .join("Google")
            .join("Chrome")
    } else {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("google-chrome")
    }
}

/// Location of the browser's "Local State" file inside a user data directory.
pub fn local_state_path(user_data_dir: &std::path::Path) -> PathBuf {
    user_data_dir.join("Local State")
}

/// Fixed install location of the Chrome executable for the current platform.
pub fn default_browser_executable() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome")
    } else {
        PathBuf::from("/usr/bin/google-chrome")
    }
}
