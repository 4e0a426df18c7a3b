//! Native messaging request loop.
//!
//! Each request asks to open a URL in a stored profile. Requests are handled
//! strictly one at a time and each one gets exactly one response frame.

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use super::framing::{read_frame, write_frame, Frame, FrameError, MAX_FRAME_LEN};
use super::launcher::BrowserLauncher;
use crate::data::{DatabaseError, ProfileStore};
use crate::engine::normalize_profile_id;

/// Browser profile directory used when a profile has none on record.
pub const DEFAULT_PROFILE_DIRECTORY: &str = "Default";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenRequest {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    profile_id: Option<String>,
}

fn success() -> Value {
    json!({ "success": true })
}

fn failure(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

pub struct CommandChannel<L> {
    profiles: ProfileStore,
    launcher: L,
}

impl<L: BrowserLauncher> CommandChannel<L> {
    pub fn new(profiles: ProfileStore, launcher: L) -> Self {
        Self { profiles, launcher }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Browser directory of a profile, or [`DEFAULT_PROFILE_DIRECTORY`] when the
    /// profile is unknown or has no directory yet.
    pub fn resolve_directory(&self, profile_id: &str) -> Result<String, DatabaseError> {
        let directory = self
            .profiles
            .directory_for(&normalize_profile_id(profile_id))?
            .filter(|dir| !dir.is_empty());
        Ok(directory.unwrap_or_else(|| DEFAULT_PROFILE_DIRECTORY.to_string()))
    }

    /// Handle one request payload and build its response.
    pub async fn handle_message(&self, payload: &[u8]) -> Value {
        let text = match std::str::from_utf8(payload) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Received non-UTF-8 native message");
                return failure(format!("Invalid UTF-8 in message: {e}"));
            }
        };
        let request: OpenRequest = match serde_json::from_str(text) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Received invalid native message");
                return failure(format!("Invalid JSON: {e}"));
            }
        };
        debug!(?request, "Received native message");

        let (Some(url), Some(profile_id)) = (
            request.url.filter(|url| !url.is_empty()),
            request.profile_id.filter(|id| !id.is_empty()),
        ) else {
            return failure("Missing url or profileId");
        };

        let directory = match self.resolve_directory(&profile_id) {
            Ok(directory) => directory,
            Err(e) => {
                error!(profile_id = %profile_id, error = %e, "Failed to look up profile directory");
                return failure(e.to_string());
            }
        };

        match self.launcher.launch(&directory, &url).await {
            Ok(()) => {
                info!(profile_id = %profile_id, directory = %directory, "Opened URL");
                success()
            }
            Err(e) => {
                error!(profile_id = %profile_id, directory = %directory, error = %e, "Failed to open URL");
                failure(e.to_string())
            }
        }
    }

    /// Serve requests from `reader` until it ends, writing responses to `writer`.
    ///
    /// A stream that ends inside a frame gets one error response and then
    /// ends the loop with the error.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), FrameError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let response = match read_frame(&mut reader).await {
                Ok(None) => {
                    info!("Native messaging input closed");
                    return Ok(());
                }
                Ok(Some(Frame::Message(payload))) => self.handle_message(&payload).await,
                Ok(Some(Frame::Oversized(len))) => {
                    warn!(len, "Discarded oversized native message");
                    failure(format!(
                        "Message of {len} bytes exceeds the {MAX_FRAME_LEN} byte limit"
                    ))
                }
                Err(e) => {
                    error!(error = %e, "Failed to read native message");
                    if let Err(write_err) = send(&mut writer, &failure(e.to_string())).await {
                        warn!(error = %write_err, "Failed to send error response");
                    }
                    return Err(e);
                }
            };
            send(&mut writer, &response).await?;
        }
    }
}

async fn send<W>(writer: &mut W, response: &Value) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    write_frame(writer, response.to_string().as_bytes()).await
}
