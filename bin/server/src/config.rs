//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (`__` separates nesting levels, e.g.
//! `PROVIDER__CLIENT_ID`). See
//! [`ProviderConfig`](gatehouse_platform_access::ProviderConfig) for the
//! identity provider settings.

use gatehouse_platform_access::ProviderConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Deployment environment name. Anything other than "production"
    /// permits detailed error messages in responses.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Frontend origin the browser is redirected to after login.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Comma-separated list of origins allowed by CORS.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Identity provider configuration.
    pub provider: ProviderConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session time-to-live in minutes.
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Interval between cleanup runs for expired sessions and abandoned
    /// login transactions, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP
    /// development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Optional domain attribute for the session cookie.
    #[serde(default)]
    pub cookie_domain: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_allowed_origins() -> String {
    "http://localhost:3000,http://localhost:8080".to_string()
}

fn default_ttl_minutes() -> i64 {
    24 * 60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
            cookie_domain: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns true when detailed error messages may be exposed to clients.
    #[must_use]
    pub fn detailed_errors(&self) -> bool {
        self.environment != "production"
    }

    /// Returns the configured CORS origins.
    #[must_use]
    pub fn cors_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.ttl_minutes, 1440);
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert!(config.secure_cookies);
        assert!(config.cookie_domain.is_none());
    }

    #[test]
    fn production_hides_detailed_errors() {
        let config = test_config("production");
        assert!(!config.detailed_errors());
        let config = test_config("development");
        assert!(config.detailed_errors());
    }

    #[test]
    fn cors_origins_parses_comma_separated() {
        let mut config = test_config("production");
        config.allowed_origins = "http://a.example, http://b.example".to_string();
        assert_eq!(
            config.cors_origins(),
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
    }

    fn test_config(environment: &str) -> ServerConfig {
        ServerConfig {
            database_url: "postgres://localhost/test".to_string(),
            listen_addr: default_listen_addr(),
            environment: environment.to_string(),
            frontend_url: default_frontend_url(),
            allowed_origins: default_allowed_origins(),
            session: SessionConfig::default(),
            provider: gatehouse_platform_access::ProviderConfig::new(
                "https://auth.example.com".to_string(),
                "http://keycloak:8080".to_string(),
                "main".to_string(),
                "spa-client".to_string(),
                None,
                None,
            ),
        }
    }
}
