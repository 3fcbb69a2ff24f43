//! Provider client tests against a mock identity provider.

use gatehouse_platform_access::{AuthFlowError, AuthPurpose, ProviderConfig};
use gatehouse_server::auth::provider::ProviderClient;
use url::Url;
use wiremock::matchers::{bearer_token, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ProviderClient {
    let config = ProviderConfig::new(
        server.uri(),
        server.uri(),
        "main".to_string(),
        "spa-client".to_string(),
        Some("s3cret".to_string()),
        None,
    );
    ProviderClient::new(config).expect("provider client")
}

#[test]
fn authorization_url_carries_flow_parameters() {
    let config = ProviderConfig::new(
        "https://auth.example.com".to_string(),
        "http://keycloak:8080".to_string(),
        "main".to_string(),
        "spa-client".to_string(),
        None,
        None,
    );
    let client = ProviderClient::new(config).expect("provider client");

    let (url, transaction) = client
        .build_authorization_url("https://app.example.com/api/auth/callback", AuthPurpose::Login)
        .expect("authorization url");

    let parsed = Url::parse(&url).expect("parsable url");
    assert_eq!(
        parsed.path(),
        "/realms/main/protocol/openid-connect/auth"
    );

    let params: std::collections::HashMap<String, String> =
        parsed.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], "spa-client");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "openid profile email");
    assert_eq!(
        params["redirect_uri"],
        "https://app.example.com/api/auth/callback"
    );
    assert_eq!(params["state"], transaction.state());
    assert_eq!(params["nonce"], transaction.nonce());
    assert!(!transaction.state().is_empty());
    assert_ne!(transaction.state(), transaction.nonce());
}

#[test]
fn authorization_state_is_unique_per_call() {
    let config = ProviderConfig::new(
        "https://auth.example.com".to_string(),
        "http://keycloak:8080".to_string(),
        "main".to_string(),
        "spa-client".to_string(),
        None,
        None,
    );
    let client = ProviderClient::new(config).expect("provider client");

    let (_, first) = client
        .build_authorization_url("https://app.example.com/cb", AuthPurpose::Login)
        .expect("authorization url");
    let (_, second) = client
        .build_authorization_url("https://app.example.com/cb", AuthPurpose::Login)
        .expect("authorization url");

    assert_ne!(first.state(), second.state());
    assert_ne!(first.nonce(), second.nonce());
}

#[test]
fn registration_uses_registrations_endpoint() {
    let config = ProviderConfig::new(
        "https://auth.example.com".to_string(),
        "http://keycloak:8080".to_string(),
        "main".to_string(),
        "spa-client".to_string(),
        None,
        None,
    );
    let client = ProviderClient::new(config).expect("provider client");

    let (url, _) = client
        .build_authorization_url("https://app.example.com/cb", AuthPurpose::Registration)
        .expect("authorization url");

    let parsed = Url::parse(&url).expect("parsable url");
    assert_eq!(
        parsed.path(),
        "/realms/main/protocol/openid-connect/registrations"
    );
}

#[tokio::test]
async fn exchange_code_returns_token_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/realms/main/protocol/openid-connect/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains("client_id=spa-client"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "id_token": "idt-1",
            "expires_in": 300,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let grant = client
        .exchange_code("abc123", "https://app.example.com/cb")
        .await
        .expect("token grant");

    assert_eq!(grant.access_token, "at-1");
    assert_eq!(grant.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(grant.id_token.as_deref(), Some("idt-1"));
    assert_eq!(grant.expires_in, Some(300));
}

#[tokio::test]
async fn exchange_code_maps_provider_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/realms/main/protocol/openid-connect/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .exchange_code("expired-code", "https://app.example.com/cb")
        .await
        .expect_err("rejection");

    assert_eq!(err.upstream_status(), Some(400));
}

#[tokio::test]
async fn fetch_user_info_parses_claims() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/realms/main/protocol/openid-connect/userinfo"))
        .and(bearer_token("at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sub": "user-1",
            "preferred_username": "alice",
            "email": "alice@example.com",
            "email_verified": true
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let user = client.fetch_user_info("at-1").await.expect("user info");

    assert_eq!(user.sub, "user-1");
    assert_eq!(user.display_username(), "alice");
    assert_eq!(user.email.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn fetch_user_info_maps_expired_token_to_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/realms/main/protocol/openid-connect/userinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_user_info("stale").await.expect_err("rejection");
    assert_eq!(err.upstream_status(), Some(401));
}

#[tokio::test]
async fn fetch_user_info_maps_provider_failure_to_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/realms/main/protocol/openid-connect/userinfo"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_user_info("at-1").await.expect_err("failure");
    assert!(matches!(err, AuthFlowError::UpstreamUnavailable { .. }));
}

#[tokio::test]
async fn revoke_refresh_token_posts_to_logout_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/realms/main/protocol/openid-connect/logout"))
        .and(body_string_contains("refresh_token=rt-1"))
        .and(body_string_contains("client_id=spa-client"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .revoke_refresh_token("rt-1")
        .await
        .expect("revocation");
}

#[tokio::test]
async fn list_users_propagates_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/realms/main/users"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.list_users("no-admin").await.expect_err("forbidden");
    assert_eq!(err.upstream_status(), Some(403));
}

#[tokio::test]
async fn delete_user_targets_specific_user() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/admin/realms/main/users/user-9"))
        .and(bearer_token("admin-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .delete_user("admin-token", "user-9")
        .await
        .expect("deletion");
}
