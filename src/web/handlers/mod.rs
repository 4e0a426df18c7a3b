//! HTTP request handlers for the tabstash web API.

use axum::Json;
use serde::Serialize;

pub mod profiles;
pub mod saved_pages;
pub mod settings;

/// Body of mutations that return nothing else.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}
