//! Shared state for the web server.

use std::sync::Arc;

use crate::core::CompanionCore;

/// State handed to every handler.
#[derive(Clone)]
pub struct WebAppState {
    core: Arc<CompanionCore>,
}

impl WebAppState {
    pub fn new(core: CompanionCore) -> Self {
        Self {
            core: Arc::new(core),
        }
    }

    pub fn core(&self) -> &CompanionCore {
        &self.core
    }
}
