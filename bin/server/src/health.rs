//! Liveness and service-index routes.

use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;

use crate::auth::AppState;

/// Service name reported by the health checks.
const SERVICE_NAME: &str = "gatehouse-server";

/// Basic liveness check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Detailed health check including uptime and database connectivity.
pub async fn health_detailed(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            "unreachable"
        }
    };

    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "database": database,
    }))
}

/// Service index describing the mounted endpoint groups.
pub async fn service_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment,
        "endpoints": {
            "health": "/health",
            "auth": "/api/auth",
            "users": "/api/users",
        },
    }))
}
