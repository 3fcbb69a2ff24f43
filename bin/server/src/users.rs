//! User profile and administration routes.
//!
//! All routes are gated by the session guard. The admin routes are thin
//! pass-throughs to the provider's user-administration API using the
//! session's access token; the provider decides whether that token carries
//! admin rights, and its 403 is propagated as an authorization failure.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use gatehouse_platform_access::UserInfo;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AppState, RequireSession, db::LastLoginRepository};
use crate::error::ApiError;

/// Response body for the profile route.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    profile: UserInfo,
    last_login: Option<DateTime<Utc>>,
}

/// Returns the authenticated user's profile with their last-login timestamp.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    RequireSession(session): RequireSession,
) -> Result<Json<ProfileResponse>, ApiError> {
    let detailed = state.detailed_errors;

    let profile = state
        .provider
        .fetch_user_info(session.access_token())
        .await
        .map_err(|e| ApiError::flow(e, detailed))?;

    let last_login = LastLoginRepository::new(state.db_pool.clone())
        .get_last_login(&profile.sub)
        .await
        .map_err(|e| ApiError::persistence(e, detailed))?;

    Ok(Json(ProfileResponse {
        profile,
        last_login,
    }))
}

/// Lists realm users via the provider's administration API.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    RequireSession(session): RequireSession,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    let detailed = state.detailed_errors;

    let users = state
        .provider
        .list_users(session.access_token())
        .await
        .map_err(|e| ApiError::flow(e, detailed))?;

    Ok(Json(users))
}

/// Deletes a realm user via the provider's administration API.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    RequireSession(session): RequireSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let detailed = state.detailed_errors;

    state
        .provider
        .delete_user(session.access_token(), &id)
        .await
        .map_err(|e| ApiError::flow(e, detailed))?;

    tracing::info!(user_id = %id, "deleted user via provider admin API");
    Ok(StatusCode::NO_CONTENT)
}
