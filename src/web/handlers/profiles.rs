//! Profile handlers for the tabstash web API.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::SuccessResponse;
use crate::core::dto::ProfileOverview;
use crate::engine::{ProfileMap, ProfileReport, TabSyncOutcome};
use crate::web::error::WebError;
use crate::web::state::WebAppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileNameQuery {
    pub profile_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileNameResponse {
    pub profile_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProfilesQuery {
    #[serde(default)]
    pub force_refresh: bool,
    pub current_profile_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedProfilesQuery {
    #[serde(default)]
    pub force_refresh: bool,
}

/// Response for a profile push.
#[derive(Debug, Serialize)]
pub struct SyncProfileResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub outcome: TabSyncOutcome,
}

/// Request to update a profile.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub hidden: Option<bool>,
}

/// Display name of a profile.
pub async fn get_profile_name(
    State(state): State<WebAppState>,
    Query(query): Query<ProfileNameQuery>,
) -> Result<Json<ProfileNameResponse>, WebError> {
    let profile_id = query.profile_id.unwrap_or_default();
    let profile_name = state.core().profile_name(&profile_id).await?;
    Ok(Json(ProfileNameResponse { profile_name }))
}

/// All stored profiles with their tabs and saved versions.
pub async fn list_profiles(
    State(state): State<WebAppState>,
    Query(query): Query<ListProfilesQuery>,
) -> Result<Json<Vec<ProfileOverview>>, WebError> {
    let overview = state
        .core()
        .profile_overview(query.current_profile_id.as_deref(), query.force_refresh)
        .await?;
    Ok(Json(overview))
}

/// The reconciled directory to profile mapping.
pub async fn resolved_profiles(
    State(state): State<WebAppState>,
    Query(query): Query<ResolvedProfilesQuery>,
) -> Json<ProfileMap> {
    let mapping = state.core().resolve_profiles(query.force_refresh).await;
    Json(mapping.as_ref().clone())
}

/// Record a profile and replace its tabs.
pub async fn sync_profile(
    State(state): State<WebAppState>,
    payload: Result<Json<ProfileReport>, JsonRejection>,
) -> Result<Json<SyncProfileResponse>, WebError> {
    let Json(report) = payload?;
    let outcome = state.core().sync_profile(&report)?;
    Ok(Json(SyncProfileResponse {
        status: "success",
        outcome,
    }))
}

/// Update a profile's visibility.
pub async fn update_profile(
    State(state): State<WebAppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, WebError> {
    let Json(req) = payload?;
    let hidden = req
        .hidden
        .ok_or_else(|| WebError::BadRequest("Missing hidden".to_string()))?;
    state.core().set_profile_hidden(&id, hidden)?;
    Ok(SuccessResponse::ok())
}

/// Delete a profile with its tabs and saved pages.
pub async fn delete_profile(
    State(state): State<WebAppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, WebError> {
    state.core().delete_profile(&id).await?;
    Ok(SuccessResponse::ok())
}
