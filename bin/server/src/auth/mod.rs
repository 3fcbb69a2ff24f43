//! Authentication for the gatehouse server.
//!
//! This module implements the server side of the OIDC Authorization Code
//! flow:
//! - the provider client (`provider`) isolating all network contact with the
//!   identity provider
//! - the flow-controller routes (`routes`): login/registration redirects, the
//!   callback exchange, logout, and the identity query
//! - the session guard extractor (`middleware`) gating authenticated routes
//! - the store accessors (`db`) for sessions, pending login transactions,
//!   and the last-login ledger
//!
//! Tokens live only in the server-side session store; the browser carries an
//! opaque session cookie.

pub mod db;
pub mod middleware;
pub mod provider;
pub mod routes;

use crate::config::{ServerConfig, SessionConfig};
use provider::ProviderClient;
use sqlx::PgPool;

pub use middleware::RequireSession;
pub use routes::{callback, login, logout, me, register};

/// Name of the opaque session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Name of the cookie binding a pending login transaction to the browser.
pub const AUTH_TXN_COOKIE: &str = "auth_txn";

/// Shared application state.
pub struct AppState {
    /// Database connection pool.
    pub db_pool: PgPool,
    /// Client for the identity provider.
    pub provider: ProviderClient,
    /// Session configuration.
    pub session: SessionConfig,
    /// Frontend origin the browser is redirected to after login.
    pub frontend_url: String,
    /// Deployment environment name, echoed by the detailed health check.
    pub environment: String,
    /// Whether error responses may carry detailed messages.
    pub detailed_errors: bool,
    /// Process start time, for the detailed health check.
    pub started_at: std::time::Instant,
}

impl AppState {
    /// Creates the application state from loaded configuration.
    pub fn new(db_pool: PgPool, provider: ProviderClient, config: &ServerConfig) -> Self {
        Self {
            db_pool,
            provider,
            session: config.session.clone(),
            frontend_url: config.frontend_url.clone(),
            environment: config.environment.clone(),
            detailed_errors: config.detailed_errors(),
            started_at: std::time::Instant::now(),
        }
    }
}
