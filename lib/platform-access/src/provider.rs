//! Identity provider configuration and endpoint computation.
//!
//! The provider is addressed through two base URLs: a browser-reachable
//! public URL used for redirects, and a network-reachable internal URL used
//! for server-to-server calls. These may differ when the provider sits behind
//! a different hostname for backend traffic than for browser traffic; a
//! deployment where the backend cannot resolve the public hostname would
//! otherwise be unable to complete the token exchange.

use serde::{Deserialize, Serialize};

/// Distinguishes a login entry from a registration entry.
///
/// Registration uses the provider's registration endpoint variant; the
/// security contract (state, nonce, code exchange) is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPurpose {
    /// Ordinary login.
    Login,
    /// Registration hint: send the user to the sign-up form.
    Registration,
}

/// Configuration for the external OIDC identity provider.
///
/// Fields with defaults can be omitted when loading from environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Browser-reachable base URL (e.g. "https://auth.example.com").
    /// Used to build authorization redirects.
    public_url: String,
    /// Network-reachable base URL for server-to-server calls
    /// (e.g. "http://keycloak:8080"). Used for token, userinfo, logout,
    /// and admin requests.
    internal_url: String,
    /// Realm (tenant) name within the provider.
    realm: String,
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret. Optional for public clients.
    #[serde(default)]
    client_secret: Option<String>,
    /// Fixed redirect URI for the OAuth2 callback. When absent, the server
    /// derives one from the inbound request and logs a warning.
    #[serde(default)]
    redirect_uri: Option<String>,
}

impl ProviderConfig {
    /// Creates a new provider configuration.
    #[must_use]
    pub fn new(
        public_url: String,
        internal_url: String,
        realm: String,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: Option<String>,
    ) -> Self {
        Self {
            public_url: trim_trailing_slash(public_url),
            internal_url: trim_trailing_slash(internal_url),
            realm,
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// Returns the browser-reachable base URL.
    #[must_use]
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    /// Returns the server-to-server base URL.
    #[must_use]
    pub fn internal_url(&self) -> &str {
        &self.internal_url
    }

    /// Returns the realm name.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret, if configured.
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    /// Returns the fixed callback redirect URI, if configured.
    #[must_use]
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    /// Authorization endpoint on the public URL.
    ///
    /// Registration uses the provider's registration endpoint variant so the
    /// user lands on the sign-up form instead of the login form.
    #[must_use]
    pub fn authorization_endpoint(&self, purpose: AuthPurpose) -> String {
        let leaf = match purpose {
            AuthPurpose::Login => "auth",
            AuthPurpose::Registration => "registrations",
        };
        format!(
            "{}/realms/{}/protocol/openid-connect/{leaf}",
            self.public_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Token endpoint on the internal URL.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.internal_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Userinfo endpoint on the internal URL.
    #[must_use]
    pub fn userinfo_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/userinfo",
            self.internal_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Logout (refresh token revocation) endpoint on the internal URL.
    #[must_use]
    pub fn logout_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/logout",
            self.internal_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// User administration collection endpoint on the internal URL.
    #[must_use]
    pub fn admin_users_endpoint(&self) -> String {
        format!(
            "{}/admin/realms/{}/users",
            self.internal_url.trim_end_matches('/'),
            self.realm
        )
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig::new(
            "https://auth.example.com".to_string(),
            "http://keycloak:8080".to_string(),
            "main".to_string(),
            "spa-client".to_string(),
            Some("s3cret".to_string()),
            None,
        )
    }

    #[test]
    fn authorization_endpoint_uses_public_url() {
        let config = test_config();
        assert_eq!(
            config.authorization_endpoint(AuthPurpose::Login),
            "https://auth.example.com/realms/main/protocol/openid-connect/auth"
        );
    }

    #[test]
    fn registration_uses_endpoint_variant() {
        let config = test_config();
        assert_eq!(
            config.authorization_endpoint(AuthPurpose::Registration),
            "https://auth.example.com/realms/main/protocol/openid-connect/registrations"
        );
    }

    #[test]
    fn server_endpoints_use_internal_url() {
        let config = test_config();
        assert_eq!(
            config.token_endpoint(),
            "http://keycloak:8080/realms/main/protocol/openid-connect/token"
        );
        assert_eq!(
            config.userinfo_endpoint(),
            "http://keycloak:8080/realms/main/protocol/openid-connect/userinfo"
        );
        assert_eq!(
            config.logout_endpoint(),
            "http://keycloak:8080/realms/main/protocol/openid-connect/logout"
        );
        assert_eq!(
            config.admin_users_endpoint(),
            "http://keycloak:8080/admin/realms/main/users"
        );
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config = ProviderConfig::new(
            "https://auth.example.com/".to_string(),
            "http://keycloak:8080//".to_string(),
            "main".to_string(),
            "spa-client".to_string(),
            None,
            None,
        );
        assert_eq!(config.public_url(), "https://auth.example.com");
        assert_eq!(config.internal_url(), "http://keycloak:8080");
    }

    #[test]
    fn deserializes_with_optional_fields_absent() {
        let json = r#"{
            "public_url": "https://auth.example.com",
            "internal_url": "http://keycloak:8080",
            "realm": "main",
            "client_id": "spa-client"
        }"#;

        let config: ProviderConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.client_secret(), None);
        assert_eq!(config.redirect_uri(), None);
    }
}
