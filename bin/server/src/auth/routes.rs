//! Authentication flow routes: login, registration, callback, identity
//! query, and logout.
//!
//! The flow is a small state machine: ANONYMOUS -> PENDING (transaction
//! stored, browser redirected to the provider) -> AUTHENTICATED (session
//! persisted) -> ANONYMOUS on logout. Validation failures in the callback
//! drop the flow back to ANONYMOUS without creating a session.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gatehouse_platform_access::{
    AuthFlowError, AuthPurpose, AuthSession, ProviderConfig, SessionId, UserInfo,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::{
    AUTH_TXN_COOKIE, AppState, RequireSession, SESSION_COOKIE,
    db::{LastLoginRepository, SessionRepository, TransactionRepository, generate_session_id},
    provider::verify_nonce,
};
use crate::error::ApiError;

/// Path the provider redirects back to after authentication.
const CALLBACK_PATH: &str = "/api/auth/callback";

/// Lifetime of the transaction-binding cookie. Pending flows older than this
/// are abandoned.
const AUTH_TXN_COOKIE_MINUTES: i64 = 10;

/// Query parameters for the OIDC callback.
///
/// Both parameters are optional at the type level so their absence maps to
/// the flow's own error kinds instead of a framework rejection.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// Initiates the login flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    begin_flow(state, &headers, jar, AuthPurpose::Login).await
}

/// Initiates the registration flow: same contract as login, but the provider
/// shows its sign-up form.
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    begin_flow(state, &headers, jar, AuthPurpose::Registration).await
}

async fn begin_flow(
    state: Arc<AppState>,
    headers: &HeaderMap,
    jar: CookieJar,
    purpose: AuthPurpose,
) -> Result<impl IntoResponse + use<>, ApiError> {
    let detailed = state.detailed_errors;
    let redirect_uri = resolve_redirect_uri(state.provider.config(), headers)?;

    // A failure here means the configured endpoint itself is unusable, which
    // is a server fault rather than a provider outage.
    let (auth_url, transaction) = state
        .provider
        .build_authorization_url(&redirect_uri, purpose)
        .map_err(|e| ApiError::internal(format!("failed to build authorization URL: {e}")))?;

    // The transaction must be durably stored before the browser leaves for
    // the provider; otherwise the callback has nothing to validate against.
    TransactionRepository::new(state.db_pool.clone())
        .create(&transaction)
        .await
        .map_err(|e| ApiError::persistence(e, detailed))?;

    let txn_cookie = Cookie::build((AUTH_TXN_COOKIE, transaction.state().to_string()))
        .path("/")
        .http_only(true)
        .secure(state.session.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(AUTH_TXN_COOKIE_MINUTES));

    Ok((jar.add(txn_cookie), Redirect::to(&auth_url)))
}

/// Handles the provider callback: validates state, exchanges the code,
/// verifies the nonce, persists the session, and redirects to the frontend.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let detailed = state.detailed_errors;
    let flow_err = |e: AuthFlowError| ApiError::flow(e, detailed);

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| flow_err(AuthFlowError::MissingCode))?;
    let callback_state = query
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| flow_err(AuthFlowError::StateMismatch))?;

    // CSRF defense: the state must match the cookie bound at flow start and
    // consume exactly one stored transaction. Both checks happen before any
    // call to the provider.
    let txn_cookie = jar
        .get(AUTH_TXN_COOKIE)
        .ok_or_else(|| flow_err(AuthFlowError::StateMismatch))?;
    if txn_cookie.value() != callback_state {
        return Err(flow_err(AuthFlowError::StateMismatch));
    }

    let transaction = TransactionRepository::new(state.db_pool.clone())
        .consume(callback_state)
        .await
        .map_err(|e| ApiError::persistence(e, detailed))?
        .ok_or_else(|| flow_err(AuthFlowError::StateMismatch))?;

    // The redirect URI must be byte-identical to the one the flow started
    // with, or the provider rejects the exchange.
    let grant = state
        .provider
        .exchange_code(code, transaction.redirect_uri())
        .await
        .map_err(flow_err)?;

    let id_token = grant.id_token.ok_or_else(|| {
        flow_err(AuthFlowError::UpstreamUnavailable {
            reason: "token response is missing id_token".to_string(),
        })
    })?;
    let refresh_token = grant.refresh_token.ok_or_else(|| {
        flow_err(AuthFlowError::UpstreamUnavailable {
            reason: "token response is missing refresh_token".to_string(),
        })
    })?;

    verify_nonce(&id_token, transaction.nonce()).map_err(flow_err)?;

    let user = state
        .provider
        .fetch_user_info(&grant.access_token)
        .await
        .map_err(flow_err)?;

    let session = AuthSession::new(
        generate_session_id(),
        user.display_username().to_string(),
        grant.access_token,
        refresh_token,
        id_token,
        grant.expires_in.unwrap_or(0),
    );

    // Persistence acknowledgement is a precondition of the redirect: a
    // failed save must surface as an error, never a logged-in redirect.
    SessionRepository::new(state.db_pool.clone())
        .create(&session, ChronoDuration::minutes(state.session.ttl_minutes))
        .await
        .map_err(|e| ApiError::persistence(e, detailed))?;

    // Advisory telemetry: never blocks or fails the login.
    if let Err(e) = LastLoginRepository::new(state.db_pool.clone())
        .record_login(&user.sub, Utc::now())
        .await
    {
        tracing::warn!(subject = %user.sub, error = %e, "failed to record last login");
    }

    tracing::info!(username = %session.username(), "login completed");

    let session_cookie = build_session_cookie(&state, session.id().as_str().to_string());
    let remove_txn = Cookie::build((AUTH_TXN_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    let jar = jar.add(session_cookie).add(remove_txn);
    Ok((jar, Redirect::to(&state.frontend_url)))
}

/// Response body for the identity query.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    user: UserInfo,
    last_login: Option<DateTime<Utc>>,
}

/// Returns fresh identity data for the authenticated session.
///
/// User info is re-fetched from the provider with the stored access token on
/// every call, so a revoked or expired token surfaces immediately.
pub async fn me(
    State(state): State<Arc<AppState>>,
    RequireSession(session): RequireSession,
) -> Result<Json<MeResponse>, ApiError> {
    let detailed = state.detailed_errors;

    let user = state
        .provider
        .fetch_user_info(session.access_token())
        .await
        .map_err(|e| ApiError::flow(e, detailed))?;

    let last_login = LastLoginRepository::new(state.db_pool.clone())
        .get_last_login(&user.sub)
        .await
        .map_err(|e| ApiError::persistence(e, detailed))?;

    Ok(Json(MeResponse { user, last_login }))
}

/// Logs out: best-effort refresh token revocation, then unconditional
/// session destruction.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let detailed = state.detailed_errors;

    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let session_id = SessionId::from(session_cookie.value());
        let repo = SessionRepository::new(state.db_pool.clone());

        match repo.find_by_id(&session_id).await {
            Ok(Some(record)) => {
                if let Err(e) = state
                    .provider
                    .revoke_refresh_token(record.session.refresh_token())
                    .await
                {
                    tracing::warn!(error = %e, "refresh token revocation failed; continuing logout");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed during logout; continuing");
            }
        }

        repo.delete(&session_id)
            .await
            .map_err(|e| ApiError::persistence(e, detailed))?;
    }

    // The removal cookie must carry the same domain attribute as the one set
    // at login, or the browser treats it as a different cookie and keeps the
    // stale one.
    let mut remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);
    if let Some(domain) = &state.session.cookie_domain {
        remove_session = remove_session.domain(domain.clone());
    }

    Ok((
        jar.add(remove_session),
        Json(serde_json::json!({ "message": "Logged out" })),
    ))
}

fn build_session_cookie(state: &AppState, session_id: String) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(state.session.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(state.session.ttl_minutes));
    if let Some(domain) = &state.session.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// Computes the effective redirect URI for a flow.
///
/// An explicitly configured value wins. Otherwise the URI is derived from
/// the inbound request's forwarded/host headers, which is byte-reproducible
/// for a given request but trusts the proxy in front of the server; a
/// warning is logged whenever this fallback is in effect.
fn resolve_redirect_uri(config: &ProviderConfig, headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(uri) = config.redirect_uri() {
        return Ok(uri.to_string());
    }

    let derived = derive_redirect_uri(headers).ok_or_else(|| {
        ApiError::internal("cannot derive redirect URI: request carries no host header".to_string())
    })?;

    tracing::warn!(
        redirect_uri = %derived,
        "provider redirect_uri is not configured; derived from request headers"
    );
    Ok(derived)
}

fn derive_redirect_uri(headers: &HeaderMap) -> Option<String> {
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))?
        .to_str()
        .ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    Some(format!("{scheme}://{host}{CALLBACK_PATH}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn derive_redirect_uri_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("app.example"));
        assert_eq!(
            derive_redirect_uri(&headers).as_deref(),
            Some("http://app.example/api/auth/callback")
        );
    }

    #[test]
    fn derive_redirect_uri_prefers_forwarded_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:3001"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("app.example"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(
            derive_redirect_uri(&headers).as_deref(),
            Some("https://app.example/api/auth/callback")
        );
    }

    #[test]
    fn derive_redirect_uri_requires_a_host() {
        let headers = HeaderMap::new();
        assert_eq!(derive_redirect_uri(&headers), None);
    }

    #[test]
    fn configured_redirect_uri_wins() {
        let config = ProviderConfig::new(
            "https://auth.example.com".to_string(),
            "http://keycloak:8080".to_string(),
            "main".to_string(),
            "spa-client".to_string(),
            None,
            Some("https://app.example/api/auth/callback".to_string()),
        );
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("other.example"));
        let resolved = resolve_redirect_uri(&config, &headers).expect("resolve");
        assert_eq!(resolved, "https://app.example/api/auth/callback");
    }
}
