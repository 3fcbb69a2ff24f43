//! Authenticated session state.
//!
//! A session is created after a successful authorization code exchange and
//! holds the provider-issued tokens server-side. The browser only ever sees
//! the opaque session identifier. A session is either fully authenticated
//! (all identity fields present) or absent; no partially-authenticated state
//! is ever persisted.

use serde::{Deserialize, Serialize};

/// Unique identifier for a session.
///
/// Session IDs are opaque strings carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session ID from a string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An authenticated session as persisted in the session store.
///
/// All identity fields are populated together when the session is created at
/// the end of a successful callback. `expires_in` is the provider-declared
/// access token lifetime in seconds and is advisory only; session expiry is
/// owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    id: SessionId,
    /// Display identifier derived from `preferred_username` or the subject.
    username: String,
    access_token: String,
    refresh_token: String,
    id_token: String,
    /// Provider-declared access token lifetime in seconds.
    expires_in: i64,
}

impl AuthSession {
    /// Creates a fully authenticated session.
    #[must_use]
    pub fn new(
        id: SessionId,
        username: String,
        access_token: String,
        refresh_token: String,
        id_token: String,
        expires_in: i64,
    ) -> Self {
        Self {
            id,
            username,
            access_token,
            refresh_token,
            id_token,
            expires_in,
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the display username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the provider-issued access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the provider-issued refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Returns the provider-issued ID token.
    #[must_use]
    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    /// Returns the advisory access token lifetime in seconds.
    #[must_use]
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// Returns true if the session carries a usable access token.
    ///
    /// The session guard admits a request only when this holds.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }
}
