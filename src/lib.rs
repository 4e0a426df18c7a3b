pub mod config;
pub mod core;
pub mod data;
pub mod engine;
pub mod native;
pub mod util;
pub mod web;

pub use config::Config;
pub use crate::core::CompanionCore;
pub use data::{Database, DatabaseError, Profile, SavedPage, Tab};
pub use engine::{EngineError, ProfileReconciler, SavedPageManager, TabSynchronizer};
pub use native::{ChromeLauncher, CommandChannel};
