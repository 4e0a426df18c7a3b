//! Settings handlers for the tabstash web API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::web::error::WebError;
use crate::web::state::WebAppState;

#[derive(Debug, Serialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: String,
}

/// Get a setting by key.
pub async fn get_setting(
    State(state): State<WebAppState>,
    Path(key): Path<String>,
) -> Result<Json<SettingResponse>, WebError> {
    let value = state
        .core()
        .get_setting(&key)?
        .ok_or_else(|| WebError::NotFound(format!("Setting {} not found", key)))?;
    Ok(Json(SettingResponse { key, value }))
}

/// Set a setting.
pub async fn update_setting(
    State(state): State<WebAppState>,
    Path(key): Path<String>,
    payload: Result<Json<UpdateSettingRequest>, JsonRejection>,
) -> Result<Json<SettingResponse>, WebError> {
    let Json(req) = payload?;
    state.core().set_setting(&key, &req.value)?;
    Ok(Json(SettingResponse {
        key,
        value: req.value,
    }))
}
