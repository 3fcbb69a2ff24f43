//! HTTP boundary error mapping.
//!
//! The flow produces a closed set of error kinds
//! ([`AuthFlowError`](gatehouse_platform_access::AuthFlowError)); this module
//! maps each kind to a status code deterministically. Upstream response
//! bodies are logged for diagnosis but never returned to clients; detailed
//! messages appear in responses only when the deployment environment permits
//! them.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_platform_access::AuthFlowError;
use serde::Serialize;

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    kind: ApiErrorKind,
    expose_detail: bool,
}

#[derive(Debug)]
enum ApiErrorKind {
    Flow(AuthFlowError),
    Internal { details: String },
}

/// JSON error body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ApiError {
    /// Wraps a flow error. `expose_detail` should come from the server's
    /// environment configuration; production deployments keep it off.
    #[must_use]
    pub fn flow(err: AuthFlowError, expose_detail: bool) -> Self {
        Self {
            kind: ApiErrorKind::Flow(err),
            expose_detail,
        }
    }

    /// Wraps a store failure as a persistence error.
    #[must_use]
    pub fn persistence(err: sqlx::Error, expose_detail: bool) -> Self {
        Self::flow(
            AuthFlowError::Persistence {
                details: err.to_string(),
            },
            expose_detail,
        )
    }

    /// An unexpected internal fault outside the flow taxonomy.
    #[must_use]
    pub fn internal(details: String) -> Self {
        Self {
            kind: ApiErrorKind::Internal { details },
            expose_detail: false,
        }
    }

    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match &self.kind {
            ApiErrorKind::Flow(AuthFlowError::MissingCode) => {
                (StatusCode::BAD_REQUEST, "Missing authorization code")
            }
            ApiErrorKind::Flow(AuthFlowError::StateMismatch) => {
                (StatusCode::BAD_REQUEST, "Invalid state")
            }
            ApiErrorKind::Flow(AuthFlowError::NonceMismatch) => {
                (StatusCode::BAD_REQUEST, "Invalid nonce")
            }
            ApiErrorKind::Flow(AuthFlowError::UpstreamRejected { status, .. }) => {
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                let message = match status {
                    StatusCode::UNAUTHORIZED => "Authentication failed",
                    StatusCode::FORBIDDEN => "Forbidden",
                    _ => "Identity provider rejected the request",
                };
                (status, message)
            }
            ApiErrorKind::Flow(AuthFlowError::UpstreamUnavailable { .. }) => {
                (StatusCode::BAD_GATEWAY, "Identity provider unavailable")
            }
            ApiErrorKind::Flow(AuthFlowError::Persistence { .. })
            | ApiErrorKind::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.kind {
            ApiErrorKind::Flow(err) if err.is_client_input() => {
                tracing::warn!(error = %err, "rejected client input");
            }
            ApiErrorKind::Flow(AuthFlowError::UpstreamRejected { status, body }) => {
                tracing::error!(status, body = %body, "identity provider rejected request");
            }
            ApiErrorKind::Flow(err) => {
                tracing::error!(error = %err, "authentication flow failed");
            }
            ApiErrorKind::Internal { details } => {
                tracing::error!(details = %details, "unhandled internal fault");
            }
        }

        let (status, message) = self.status_and_message();
        let detail = if self.expose_detail {
            Some(match &self.kind {
                ApiErrorKind::Flow(err) => err.to_string(),
                ApiErrorKind::Internal { details } => details.clone(),
            })
        } else {
            None
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                detail,
            }),
        )
            .into_response()
    }
}
