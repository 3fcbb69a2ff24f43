//! Per-request correlation identifiers.
//!
//! Each request gets a fresh ULID that is attached to the request's tracing
//! span and echoed back in the `X-Request-ID` response header, so log lines
//! produced anywhere in a handler can be correlated with the response the
//! client saw.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Response header carrying the correlation identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware assigning a correlation identifier to every request.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = ulid::Ulid::new().to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}
