//! Opening a URL in a given browser profile.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Browser executable not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Browser executable at {} is not executable", .0.display())]
    NotExecutable(PathBuf),

    #[error("Failed to launch browser: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Browser exited with {0}")]
    Exit(ExitStatus),
}

/// Something that can open a URL in a browser profile directory.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, profile_directory: &str, url: &str) -> Result<(), LaunchError>;
}

/// Launches a Chromium-family browser binary.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    executable: PathBuf,
}

impl ChromeLauncher {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Command line arguments for opening `url` in `profile_directory`.
    pub fn args(profile_directory: &str, url: &str) -> Vec<String> {
        vec![
            format!("--profile-directory={profile_directory}"),
            url.to_string(),
            "--new-window".to_string(),
        ]
    }

    async fn check_executable(&self) -> Result<(), LaunchError> {
        let metadata = match tokio::fs::metadata(&self.executable).await {
            Ok(metadata) => metadata,
            Err(_) => return Err(LaunchError::NotFound(self.executable.clone())),
        };
        if !metadata.is_file() {
            return Err(LaunchError::NotExecutable(self.executable.clone()));
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(LaunchError::NotExecutable(self.executable.clone()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, profile_directory: &str, url: &str) -> Result<(), LaunchError> {
        self.check_executable().await?;

        let args = Self::args(profile_directory, url);
        debug!(executable = %self.executable.display(), ?args, "Launching browser");

        // stdout carries native messaging frames and must stay clean
        let status = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(LaunchError::Spawn)?;

        if !status.success() {
            return Err(LaunchError::Exit(status));
        }
        info!(profile_directory, url, "Opened URL in browser");
        Ok(())
    }
}
