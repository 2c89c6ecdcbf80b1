//! Security headers middleware
//!
//! The API only ever serves JSON and Prometheus text, so responses are
//! locked down to that: no sniffing, no framing, no referrer, no caching of
//! token-bearing responses.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

const API_HEADERS: &[(header::HeaderName, &str)] = &[
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::CONTENT_SECURITY_POLICY, "default-src 'none'; frame-ancestors 'none'"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::STRICT_TRANSPORT_SECURITY, "max-age=31536000; includeSubDomains"),
];

/// Add security headers to every response
///
/// Responses under `/api/v1/auth` additionally get `Cache-Control: no-store`.
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let no_store = request.uri().path().contains("/auth/");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in API_HEADERS {
        headers.insert(name.clone(), HeaderValue::from_static(value));
    }

    if no_store {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}
