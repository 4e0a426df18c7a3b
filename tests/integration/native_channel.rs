//! Integration tests for the native messaging host
//!
//! Tests the request loop against a real database and the packaged binary
//! against a framed stdin.

use super::common::{decode_frames, frame, TestEnv};
use assert_cmd::Command;
use async_trait::async_trait;
use parking_lot::Mutex;
use predicates::prelude::*;
use serde_json::json;
use tabstash::native::{BrowserLauncher, CommandChannel, LaunchError, DEFAULT_PROFILE_DIRECTORY};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingLauncher {
    launches: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl BrowserLauncher for RecordingLauncher {
    async fn launch(&self, profile_directory: &str, url: &str) -> Result<(), LaunchError> {
        self.launches
            .lock()
            .push((profile_directory.to_string(), url.to_string()));
        Ok(())
    }
}

/// Test opening URLs for a reconciled profile and an unknown one
#[tokio::test]
async fn test_open_url_in_reconciled_profile() {
    let env = TestEnv::with_profiles(&[("Profile 1", "Work")]);
    let core = env.core();
    let mapping = core.resolve_profiles(false).await;
    let work = mapping["profile 1"].profile_id.clone();
    let channel = CommandChannel::new(core.profile_store_clone(), RecordingLauncher::default());

    let mut input = frame(json!({"url": "https://a", "profileId": work}).to_string().as_bytes());
    input.extend(frame(
        json!({"url": "https://b", "profileId": "ghost"}).to_string().as_bytes(),
    ));
    let mut output = Vec::new();
    channel.serve(input.as_slice(), &mut output).await.unwrap();

    let responses = decode_frames(&output);
    assert_eq!(responses, vec![json!({"success": true}), json!({"success": true})]);
    let launches = channel.launcher().launches.lock().clone();
    assert_eq!(
        launches,
        vec![
            ("profile 1".to_string(), "https://a".to_string()),
            (DEFAULT_PROFILE_DIRECTORY.to_string(), "https://b".to_string()),
        ]
    );
}

/// Test that the binary answers a malformed request with one error frame
#[test]
fn test_binary_rejects_invalid_json() {
    let data_dir = TempDir::new().unwrap();

    let output = Command::cargo_bin("tabstash")
        .unwrap()
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("--native-messaging")
        .write_stdin(frame(b"not json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let responses = decode_frames(&output.stdout);
    assert_eq!(responses.len(), 1);
    let message = responses[0]["error"].as_str().unwrap();
    assert!(message.starts_with("Invalid JSON"));
}

/// Test that a browser-style invocation selects native messaging mode
#[test]
fn test_binary_detects_extension_origin() {
    let data_dir = TempDir::new().unwrap();

    let output = Command::cargo_bin("tabstash")
        .unwrap()
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("chrome-extension://abcdefghijklmnop/")
        .write_stdin(frame(br#"{"url": "https://a"}"#))
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        decode_frames(&output.stdout),
        vec![json!({"error": "Missing url or profileId"})]
    );
}

/// Test that the help text lists both run modes
#[test]
fn test_binary_help_lists_modes() {
    Command::cargo_bin("tabstash")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve").and(predicate::str::contains("native-messaging")));
}
