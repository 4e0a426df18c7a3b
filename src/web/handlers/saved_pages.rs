//! Saved page handlers for the tabstash web API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SuccessResponse;
use crate::engine::{DeleteTarget, SavedPageEntry};
use crate::web::error::WebError;
use crate::web::state::WebAppState;

/// Request to archive a page snapshot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePageRequest {
    pub url: Option<String>,
    pub title: Option<String>,
    /// Base64-encoded MHTML document
    pub mhtml_data: Option<String>,
    pub profile_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePageResponse {
    pub id: i64,
    pub file_name: String,
    pub timestamp: String,
    pub title: String,
    pub file_path: String,
    pub success: bool,
}

/// Request to delete a saved page. `id` may be a number or an `orphan-<name>` string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSavedPageRequest {
    pub id: Option<Value>,
    pub file_path: Option<String>,
}

/// Archive a page snapshot.
pub async fn save_page(
    State(state): State<WebAppState>,
    payload: Result<Json<SavePageRequest>, JsonRejection>,
) -> Result<Json<SavePageResponse>, WebError> {
    let Json(req) = payload?;
    let (Some(url), Some(title), Some(data), Some(profile_id)) =
        (req.url, req.title, req.mhtml_data, req.profile_id)
    else {
        return Err(WebError::BadRequest("Missing required fields".to_string()));
    };
    let content = STANDARD
        .decode(data.trim())
        .map_err(|e| WebError::BadRequest(format!("Invalid mhtmlData: {}", e)))?;

    let page = state
        .core()
        .create_saved_page(&url, &title, &content, &profile_id)
        .await?;

    Ok(Json(SavePageResponse {
        id: page.id,
        file_name: page.file_name,
        timestamp: page.timestamp,
        title: page.title,
        file_path: page.file_path,
        success: true,
    }))
}

/// List saved pages whose files exist, followed by orphan files.
pub async fn list_saved_pages(
    State(state): State<WebAppState>,
) -> Result<Json<Vec<SavedPageEntry>>, WebError> {
    Ok(Json(state.core().list_saved_pages().await?))
}

/// Delete a saved page and its file.
pub async fn delete_saved_page(
    State(state): State<WebAppState>,
    payload: Result<Json<DeleteSavedPageRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, WebError> {
    let Json(req) = payload?;
    let id = match req.id {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(WebError::BadRequest(format!("Invalid id: {}", other)));
        }
    };
    let target = DeleteTarget::from_request(id.as_deref(), req.file_path.as_deref())?;
    state.core().delete_saved_page(&target).await?;
    Ok(SuccessResponse::ok())
}
