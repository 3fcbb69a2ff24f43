//! User identity claims returned by the provider's userinfo endpoint.

use serde::{Deserialize, Serialize};

/// Standard OIDC claims for an authenticated user.
///
/// Unknown provider-specific claims are preserved in `extra` so the frontend
/// receives the provider's payload unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// The provider's stable unique identifier for the user.
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Provider-specific claims outside the standard set.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserInfo {
    /// Returns the display identifier: `preferred_username` when present,
    /// else the subject.
    #[must_use]
    pub fn display_username(&self) -> &str {
        self.preferred_username.as_deref().unwrap_or(&self.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_username_prefers_preferred_username() {
        let info: UserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1234-abcd",
            "preferred_username": "alice",
            "email": "alice@example.com"
        }))
        .expect("deserialize");
        assert_eq!(info.display_username(), "alice");
    }

    #[test]
    fn display_username_falls_back_to_subject() {
        let info: UserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1234-abcd"
        }))
        .expect("deserialize");
        assert_eq!(info.display_username(), "1234-abcd");
    }

    #[test]
    fn unknown_claims_are_preserved() {
        let info: UserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1234-abcd",
            "locale": "en-US"
        }))
        .expect("deserialize");
        assert_eq!(
            info.extra.get("locale").and_then(|v| v.as_str()),
            Some("en-US")
        );
    }
}
