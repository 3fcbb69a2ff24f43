//! Platform access types for the gatehouse authentication proxy.
//!
//! This crate provides the domain types shared by the gatehouse server:
//! - Identity provider configuration and endpoint computation (`ProviderConfig`)
//! - Authenticated session state (`AuthSession`, `SessionId`)
//! - The ephemeral login transaction carried across the redirect/callback
//!   round trip (`LoginTransaction`)
//! - User identity claims returned by the provider (`UserInfo`)
//! - The closed error taxonomy for the authentication flow (`AuthFlowError`)
//!
//! # Flow Model
//!
//! The server mediates the OIDC Authorization Code flow on behalf of a
//! browser frontend. Tokens never reach the browser; the frontend holds only
//! an opaque session cookie. A login begins by storing a `LoginTransaction`
//! and redirecting to the provider; the callback consumes that transaction
//! exactly once, exchanges the code for tokens, and persists an
//! `AuthSession`.

pub mod error;
pub mod provider;
pub mod session;
pub mod transaction;
pub mod user;

pub use error::AuthFlowError;
pub use provider::{AuthPurpose, ProviderConfig};
pub use session::{AuthSession, SessionId};
pub use transaction::LoginTransaction;
pub use user::UserInfo;
