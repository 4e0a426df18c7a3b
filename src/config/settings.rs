use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::util::paths::{
    browser_user_data_dir, config_path, default_browser_executable, default_snapshot_dir,
};

/// How long a resolved profile mapping stays fresh.
pub const DEFAULT_PROFILE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address the HTTP adapter binds to
    pub host: String,
    /// Port the HTTP adapter listens on
    pub port: u16,
    /// Browser user data directory (holds "Local State")
    pub browser_user_data_dir: PathBuf,
    /// Browser executable used by the native messaging channel
    pub browser_executable: PathBuf,
    /// Freshness window of the resolved profile mapping
    pub profile_cache_ttl: Duration,
    /// Snapshot directory used while the `snapshot_dir` setting is unset
    pub default_snapshot_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            browser_user_data_dir: browser_user_data_dir(),
            browser_executable: default_browser_executable(),
            profile_cache_ttl: DEFAULT_PROFILE_CACHE_TTL,
            default_snapshot_dir: default_snapshot_dir(),
        }
    }
}

/// TOML representation of the `[server]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// TOML representation of the `[browser]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlBrowserConfig {
    /// Override for the browser user data directory
    pub user_data_dir: Option<PathBuf>,
    /// Override for the browser executable (absolute path or a name looked up on PATH)
    pub executable: Option<PathBuf>,
}

/// TOML representation of the `[profiles]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlProfilesConfig {
    pub cache_ttl_secs: Option<u64>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub server: Option<TomlServerConfig>,
    pub browser: Option<TomlBrowserConfig>,
    pub profiles: Option<TomlProfilesConfig>,
}

impl Config {
    /// Load configuration from the default config file, merging with defaults
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load configuration from `path`. A missing file yields the defaults; a
    /// malformed one is logged and ignored.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Config::default();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read config file");
                }
                return config;
            }
        };

        let toml_config = match toml::from_str::<TomlConfig>(&contents) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config file");
                return config;
            }
        };

        if let Some(server) = toml_config.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
        }

        if let Some(browser) = toml_config.browser {
            if let Some(dir) = browser.user_data_dir {
                config.browser_user_data_dir = dir;
            }
            if let Some(executable) = browser.executable {
                config.browser_executable = resolve_executable(executable);
            }
        }

        if let Some(ttl) = toml_config.profiles.and_then(|p| p.cache_ttl_secs) {
            config.profile_cache_ttl = Duration::from_secs(ttl);
        }

        config
    }

    pub fn with_browser_user_data_dir(mut self, dir: PathBuf) -> Self {
        self.browser_user_data_dir = dir;
        self
    }

    pub fn with_browser_executable(mut self, path: PathBuf) -> Self {
        self.browser_executable = path;
        self
    }

    pub fn with_profile_cache_ttl(mut self, ttl: Duration) -> Self {
        self.profile_cache_ttl = ttl;
        self
    }

    pub fn with_default_snapshot_dir(mut self, dir: PathBuf) -> Self {
        self.default_snapshot_dir = dir;
        self
    }

    /// Path of the browser's "Local State" file
    pub fn local_state_path(&self) -> PathBuf {
        crate::util::paths::local_state_path(&self.browser_user_data_dir)
    }
}

/// Bare executable names (e.g. `chromium`) are looked up on PATH.
fn resolve_executable(executable: PathBuf) -> PathBuf {
    if executable.components().count() > 1 || executable.is_absolute() {
        return executable;
    }
    which::which(&executable).unwrap_or(executable)
}
