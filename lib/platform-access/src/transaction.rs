//! The ephemeral login transaction.
//!
//! A transaction is created when a login or registration redirect is issued
//! and lives only for the redirect/callback round trip. It binds the
//! anti-forgery `state`, the replay-protection `nonce`, and the exact
//! redirect URI the flow was started with. The callback consumes the
//! transaction exactly once; a transaction abandoned by the browser is
//! purged by the periodic cleanup task.

use serde::{Deserialize, Serialize};

/// State held server-side during the redirect/callback round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginTransaction {
    /// Anti-CSRF token binding the authorization request to its callback.
    /// Single use; bound to exactly one pending flow.
    state: String,
    /// Anti-replay token validated against the returned ID token's `nonce`
    /// claim.
    nonce: String,
    /// The callback URL this flow was started with. Must be echoed unchanged
    /// to the token exchange.
    redirect_uri: String,
}

impl LoginTransaction {
    /// Creates a new transaction.
    #[must_use]
    pub fn new(state: String, nonce: String, redirect_uri: String) -> Self {
        Self {
            state,
            nonce,
            redirect_uri,
        }
    }

    /// Returns the anti-CSRF state token.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the anti-replay nonce.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Returns the redirect URI the flow was started with.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}
