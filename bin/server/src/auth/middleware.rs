//! Session guard extractor for Axum.
//!
//! The guard passes a request through only when the session store holds a
//! session with a non-empty access token for the cookie-carried identifier.
//! Otherwise the request short-circuits with an access-denied response and
//! downstream logic never runs.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use gatehouse_platform_access::SessionId;
use std::sync::Arc;

use super::{AppState, SESSION_COOKIE, db::SessionRepository};

/// Extractor requiring an authenticated session.
pub struct RequireSession(pub gatehouse_platform_access::AuthSession);

impl<S> FromRequestParts<S> for RequireSession
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| SessionRejection::Internal)?;

        let session_cookie = jar.get(SESSION_COOKIE).ok_or(SessionRejection::Denied)?;
        let session_id = SessionId::from(session_cookie.value());

        let repo = SessionRepository::new(app_state.db_pool.clone());
        let record = repo
            .find_by_id(&session_id)
            .await
            .map_err(|_| SessionRejection::Internal)?
            .ok_or(SessionRejection::Denied)?;

        if record.is_expired() {
            // Expired rows are deleted on sight; the cleanup task handles
            // the rest.
            let _ = repo.delete(&session_id).await;
            return Err(SessionRejection::Denied);
        }

        if !record.session.is_authenticated() {
            return Err(SessionRejection::Denied);
        }

        Ok(RequireSession(record.session))
    }
}

/// Rejection type for the session guard.
#[derive(Debug)]
pub enum SessionRejection {
    /// No valid authenticated session.
    Denied,
    /// The session store could not be consulted.
    Internal,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Denied => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Access denied" })),
            )
                .into_response(),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}
