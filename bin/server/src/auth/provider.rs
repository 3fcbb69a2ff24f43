//! HTTP client for the external OIDC identity provider.
//!
//! Every operation is a stateless transform over provider endpoints computed
//! from configuration. Authorization redirects use the browser-reachable
//! public URL; token, userinfo, logout, and admin calls use the
//! network-reachable internal URL. All server-to-server requests carry an
//! explicit timeout so an unreachable provider surfaces as
//! `UpstreamUnavailable` instead of hanging.

use base64::Engine;
use gatehouse_platform_access::{AuthFlowError, AuthPurpose, LoginTransaction, ProviderConfig, UserInfo};
use oauth2::CsrfToken;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Timeout for all server-to-server provider requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Scope requested for every login and registration flow.
const OIDC_SCOPE: &str = "openid profile email";

/// Client for the identity provider's endpoints.
pub struct ProviderClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

/// Raw token payload returned by the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Errors constructing the provider client.
#[derive(Debug)]
pub enum ProviderInitError {
    /// A configured base URL does not parse.
    InvalidUrl { url: String, reason: String },
    /// The HTTP client could not be constructed.
    HttpClient(String),
}

impl std::fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl { url, reason } => {
                write!(f, "invalid provider URL '{url}': {reason}")
            }
            Self::HttpClient(msg) => write!(f, "failed to create HTTP client: {msg}"),
        }
    }
}

impl std::error::Error for ProviderInitError {}

impl ProviderClient {
    /// Creates a new provider client, validating the configured base URLs.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderInitError> {
        for base in [config.public_url(), config.internal_url()] {
            Url::parse(base).map_err(|e| ProviderInitError::InvalidUrl {
                url: base.to_string(),
                reason: e.to_string(),
            })?;
        }

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderInitError::HttpClient(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Builds the authorization URL for a login or registration redirect.
    ///
    /// Generates a fresh state and nonce per call; aside from that this is a
    /// pure transform over configuration and performs no I/O. The returned
    /// transaction must be stored before the browser is redirected.
    pub fn build_authorization_url(
        &self,
        redirect_uri: &str,
        purpose: AuthPurpose,
    ) -> Result<(String, LoginTransaction), AuthFlowError> {
        let state = CsrfToken::new_random().secret().clone();
        let nonce = CsrfToken::new_random().secret().clone();

        let url = Url::parse_with_params(
            &self.config.authorization_endpoint(purpose),
            &[
                ("client_id", self.config.client_id()),
                ("response_type", "code"),
                ("scope", OIDC_SCOPE),
                ("redirect_uri", redirect_uri),
                ("state", state.as_str()),
                ("nonce", nonce.as_str()),
            ],
        )
        .map_err(|e| AuthFlowError::UpstreamUnavailable {
            reason: format!("invalid authorization endpoint: {e}"),
        })?;

        let transaction = LoginTransaction::new(state, nonce, redirect_uri.to_string());
        Ok((url.to_string(), transaction))
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// The redirect URI must exactly match the one used to obtain the code;
    /// the provider rejects the exchange otherwise. Provider rejections
    /// (expired code, already-used code, mismatched redirect URI) surface as
    /// `UpstreamRejected` with the provider's status.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, AuthFlowError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id()),
            ("redirect_uri", redirect_uri),
        ];
        if let Some(secret) = self.config.client_secret() {
            form.push(("client_secret", secret));
        }

        let response = self
            .http
            .post(self.config.token_endpoint())
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        response
            .json::<TokenGrant>()
            .await
            .map_err(|e| AuthFlowError::UpstreamUnavailable {
                reason: format!("malformed token response: {e}"),
            })
    }

    /// Fetches fresh user info with a bearer access token.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, AuthFlowError> {
        let response = self
            .http
            .get(self.config.userinfo_endpoint())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        response
            .json::<UserInfo>()
            .await
            .map_err(|e| AuthFlowError::UpstreamUnavailable {
                reason: format!("malformed userinfo response: {e}"),
            })
    }

    /// Revokes a refresh token at the provider's logout endpoint.
    ///
    /// Callers treat failure here as non-fatal; logout proceeds regardless.
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<(), AuthFlowError> {
        let mut form = vec![
            ("client_id", self.config.client_id()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = self.config.client_secret() {
            form.push(("client_secret", secret));
        }

        let response = self
            .http
            .post(self.config.logout_endpoint())
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        Ok(())
    }

    /// Lists realm users through the provider's administration API.
    ///
    /// Pass-through: the provider's 403 is propagated distinctly so the
    /// caller can map it to an authorization failure rather than a generic
    /// server error.
    pub async fn list_users(
        &self,
        admin_access_token: &str,
    ) -> Result<Vec<serde_json::Value>, AuthFlowError> {
        let response = self
            .http
            .get(self.config.admin_users_endpoint())
            .bearer_auth(admin_access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        response
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(|e| AuthFlowError::UpstreamUnavailable {
                reason: format!("malformed user list response: {e}"),
            })
    }

    /// Deletes a realm user through the provider's administration API.
    pub async fn delete_user(
        &self,
        admin_access_token: &str,
        id: &str,
    ) -> Result<(), AuthFlowError> {
        let response = self
            .http
            .delete(format!("{}/{id}", self.config.admin_users_endpoint()))
            .bearer_auth(admin_access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        Ok(())
    }
}

/// Verifies the ID token's `nonce` claim against the stored transaction.
///
/// The payload is decoded without signature verification; the token was just
/// received over the direct server-to-provider channel, so this check defends
/// against replay of a different flow's token, not forgery.
pub fn verify_nonce(id_token: &str, expected_nonce: &str) -> Result<(), AuthFlowError> {
    let mut parts = id_token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(AuthFlowError::UpstreamUnavailable {
                reason: "malformed ID token".to_string(),
            });
        }
    };

    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthFlowError::UpstreamUnavailable {
            reason: format!("undecodable ID token payload: {e}"),
        })?;

    let claims: serde_json::Value =
        serde_json::from_slice(&payload_bytes).map_err(|e| AuthFlowError::UpstreamUnavailable {
            reason: format!("unparsable ID token payload: {e}"),
        })?;

    match claims.get("nonce").and_then(|v| v.as_str()) {
        Some(nonce) if nonce == expected_nonce => Ok(()),
        _ => Err(AuthFlowError::NonceMismatch),
    }
}

fn transport_error(e: reqwest::Error) -> AuthFlowError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    AuthFlowError::UpstreamUnavailable { reason }
}

fn status_error(status: reqwest::StatusCode, body: String) -> AuthFlowError {
    if status.is_client_error() {
        AuthFlowError::UpstreamRejected {
            status: status.as_u16(),
            body,
        }
    } else {
        AuthFlowError::UpstreamUnavailable {
            reason: format!("provider returned status {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_id_token(claims: serde_json::Value) -> String {
        let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = engine.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn verify_nonce_accepts_matching_claim() {
        let token = make_id_token(serde_json::json!({ "sub": "u1", "nonce": "N1" }));
        assert!(verify_nonce(&token, "N1").is_ok());
    }

    #[test]
    fn verify_nonce_rejects_mismatched_claim() {
        let token = make_id_token(serde_json::json!({ "sub": "u1", "nonce": "N2" }));
        assert_eq!(verify_nonce(&token, "N1"), Err(AuthFlowError::NonceMismatch));
    }

    #[test]
    fn verify_nonce_rejects_absent_claim() {
        let token = make_id_token(serde_json::json!({ "sub": "u1" }));
        assert_eq!(verify_nonce(&token, "N1"), Err(AuthFlowError::NonceMismatch));
    }

    #[test]
    fn verify_nonce_rejects_malformed_token() {
        let err = verify_nonce("not-a-jwt", "N1").unwrap_err();
        assert!(matches!(err, AuthFlowError::UpstreamUnavailable { .. }));
    }
}
