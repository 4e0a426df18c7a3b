//! Integration tests for tabstash
//!
//! These tests drive the engine through `CompanionCore` and the binary the
//! way the extension and the browser do.

#[path = "../common/mod.rs"]
pub mod common;

pub mod native_channel;
pub mod profile_flow;
pub mod saved_pages_flow;
