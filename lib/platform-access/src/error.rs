//! The closed error taxonomy for the authentication flow.
//!
//! Every failure the flow can produce maps to exactly one of these kinds, so
//! the HTTP boundary can translate kinds to status codes deterministically
//! instead of inspecting ad hoc error properties.

use std::fmt;

/// Errors from the authentication flow and provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFlowError {
    /// The callback arrived without a `code` query parameter.
    MissingCode,
    /// The callback `state` did not match a stored transaction, or the
    /// transaction was already consumed. This is the CSRF defense; it is
    /// checked before any token exchange is attempted.
    StateMismatch,
    /// The ID token's `nonce` claim did not match the stored transaction.
    NonceMismatch,
    /// The provider rejected a code or token (expired, already used,
    /// mismatched redirect URI, revoked). Carries the provider's status and
    /// response body for diagnosis; the body is never shown to clients in
    /// production.
    UpstreamRejected { status: u16, body: String },
    /// The provider could not be reached, timed out, or failed internally.
    UpstreamUnavailable { reason: String },
    /// The session store or relational store failed.
    Persistence { details: String },
}

impl AuthFlowError {
    /// Returns true for errors caused by the client's request, which are
    /// never retried and logged at warn.
    #[must_use]
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            Self::MissingCode | Self::StateMismatch | Self::NonceMismatch
        )
    }

    /// Returns the provider status for upstream rejections.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for AuthFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCode => write!(f, "missing authorization code"),
            Self::StateMismatch => write!(f, "state does not match a pending login transaction"),
            Self::NonceMismatch => write!(f, "ID token nonce does not match the login transaction"),
            Self::UpstreamRejected { status, .. } => {
                write!(f, "identity provider rejected the request with status {status}")
            }
            Self::UpstreamUnavailable { reason } => {
                write!(f, "identity provider unavailable: {reason}")
            }
            Self::Persistence { details } => write!(f, "persistence error: {details}"),
        }
    }
}

impl std::error::Error for AuthFlowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_input_classification() {
        assert!(AuthFlowError::MissingCode.is_client_input());
        assert!(AuthFlowError::StateMismatch.is_client_input());
        assert!(AuthFlowError::NonceMismatch.is_client_input());
        assert!(
            !AuthFlowError::UpstreamRejected {
                status: 400,
                body: String::new()
            }
            .is_client_input()
        );
        assert!(
            !AuthFlowError::Persistence {
                details: "pool closed".to_string()
            }
            .is_client_input()
        );
    }

    #[test]
    fn upstream_status_is_carried() {
        let err = AuthFlowError::UpstreamRejected {
            status: 403,
            body: "insufficient_scope".to_string(),
        };
        assert_eq!(err.upstream_status(), Some(403));
        assert_eq!(AuthFlowError::MissingCode.upstream_status(), None);
    }

    #[test]
    fn display_does_not_leak_upstream_body() {
        let err = AuthFlowError::UpstreamRejected {
            status: 400,
            body: "secret diagnostic".to_string(),
        };
        assert!(!err.to_string().contains("secret diagnostic"));
    }
}
