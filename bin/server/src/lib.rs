//! HTTP server for the gatehouse authentication service.
//!
//! Acts as a backend-for-frontend in front of an OIDC identity provider:
//! the browser only ever holds an opaque session cookie while the tokens
//! stay server-side in PostgreSQL.

pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod request_id;
pub mod users;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use auth::AppState;

/// Builds the application router with all routes and layers.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/detailed", get(health::health_detailed))
        .route("/api", get(health::service_index))
        .route("/api/auth/login", get(auth::login))
        .route("/api/auth/register", get(auth::register))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/users/profile", get(users::profile))
        .route("/api/users", get(users::list_users))
        .route("/api/users/{id}", delete(users::delete_user))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds a CORS layer allowing the configured frontend origins.
///
/// Credentials are allowed because the browser sends the session cookie on
/// cross-origin API calls, which in turn rules out a wildcard origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-requested-with"),
        ])
}
