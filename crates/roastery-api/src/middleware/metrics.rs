//! Metrics tracking middleware
//!
//! Tracks request latency, counts, and status codes for Prometheus metrics

use crate::metrics::record_http_request;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

/// Metrics tracking middleware
///
/// Records:
/// - Request count per method, endpoint and status
/// - Request latency distribution
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    // Normalize the path for metrics (remove IDs)
    let endpoint = normalize_endpoint(request.uri().path());

    let response = next.run(request).await;

    state.increment_requests();
    record_http_request(&method, &endpoint, response.status().as_u16(), start.elapsed());

    response
}

/// Normalize endpoint paths for consistent metrics
///
/// Replaces UUID/ID segments with placeholders to group similar endpoints
fn normalize_endpoint(path: &str) -> String {
    path.split('/')
        .map(|seg| if is_uuid(seg) || is_numeric(seg) { ":id" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}

/// Check if a string looks like a UUID
fn is_uuid(s: &str) -> bool {
    s.len() == 36
        && s.chars().enumerate().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

/// Check if a string is numeric (likely an ID)
fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("/api/v1/beans/550e8400-e29b-41d4-a716-446655440000/reviews"),
            "/api/v1/beans/:id/reviews"
        );
        assert_eq!(
            normalize_endpoint(
                "/api/v1/lists/550e8400-e29b-41d4-a716-446655440000/beans/6ba7b810-9dad-11d1-80b4-00c04fd430c8"
            ),
            "/api/v1/lists/:id/beans/:id"
        );
        assert_eq!(normalize_endpoint("/api/v1/tags/42"), "/api/v1/tags/:id");
        assert_eq!(normalize_endpoint("/health"), "/health");
    }

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_uuid("not-a-uuid"));
        assert!(!is_uuid("123"));
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("123"));
        assert!(!is_numeric("12a"));
        assert!(!is_numeric(""));
    }
}
