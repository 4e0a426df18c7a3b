//! REST API route definitions.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::web::handlers::{profiles, saved_pages, settings};
use crate::web::state::WebAppState;

/// Build the API router with all REST endpoints.
pub fn api_routes() -> Router<WebAppState> {
    Router::new()
        // Profile routes
        .route("/profile-name", get(profiles::get_profile_name))
        .route("/profiles", get(profiles::list_profiles))
        .route("/profiles", post(profiles::sync_profile))
        .route("/profiles/resolved", get(profiles::resolved_profiles))
        .route("/profiles/{id}", patch(profiles::update_profile))
        .route("/profiles/{id}", delete(profiles::delete_profile))
        // Saved page routes
        .route("/save-page", post(saved_pages::save_page))
        .route("/saved-pages", get(saved_pages::list_saved_pages))
        .route("/saved-page", delete(saved_pages::delete_saved_page))
        // Settings routes
        .route("/settings/{key}", get(settings::get_setting))
        .route("/settings/{key}", put(settings::update_setting))
}
