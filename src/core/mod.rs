//! Core module wiring the engine to its stores.
//!
//! [`CompanionCore`] is shared by both outer surfaces:
//! - the HTTP adapter used by the extension
//! - the native messaging channel used to open pages in a profile

mod companion_core;
pub mod dto;

pub use companion_core::{CompanionCore, UNKNOWN_PROFILE_NAME};
