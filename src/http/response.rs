//! Response handling.
//!
//! # Responsibilities
//! - Fixed responses produced by the proxy itself (400, 407, 413, 500)
//! - Relay an upstream response: status and body verbatim, headers minus
//!   the hop-by-hop set
//!
//! # Design Decisions
//! - The exhausted-retries 500 is synthesized as an upstream-shaped
//!   response and goes through the same relay path

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderValue, Response as HttpResponse, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::security::sanitize_response_headers;

pub const ADMISSION_REJECTED_BODY: &str = "Missing or invalid PROXYKEY header.";
pub const MALFORMED_ROUTE_BODY: &str = "URL format invalid.";
pub const RETRIES_EXHAUSTED_BODY: &str = "Proxy failed to connect. Please try again.";
pub const BODY_TOO_LARGE_BODY: &str = "Request body too large.";

/// 407: admission header missing or wrong.
pub fn admission_rejected() -> Response {
    (StatusCode::PROXY_AUTHENTICATION_REQUIRED, ADMISSION_REJECTED_BODY).into_response()
}

/// 400: request-target cannot be split into subdomain and remainder.
pub fn malformed_route() -> Response {
    (StatusCode::BAD_REQUEST, MALFORMED_ROUTE_BODY).into_response()
}

/// 413: inbound body too large (or unreadable) to buffer for replay.
pub fn body_too_large() -> Response {
    (StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE_BODY).into_response()
}

/// Synthetic upstream response standing in for an exhausted retry loop.
pub fn retries_exhausted() -> HttpResponse<Bytes> {
    let mut response = HttpResponse::new(Bytes::from_static(RETRIES_EXHAUSTED_BODY.as_bytes()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Copy an upstream response back onto the inbound side.
pub fn relay(upstream: HttpResponse<Bytes>) -> Response {
    let (parts, body) = upstream.into_parts();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = parts.status;
    *response.headers_mut() = sanitize_response_headers(&parts.headers);
    response
}
