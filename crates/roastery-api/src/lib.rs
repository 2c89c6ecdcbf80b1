//! Roastery API - REST server for the coffee catalog
//!
//! Provides HTTP endpoints for beans, origins, tags, reviews and user lists,
//! plus account registration and the token lifecycle.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod operation;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use roastery_core::ServerConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::prometheus_metrics))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http());

    if state.config.server.cors_enabled {
        router = router.layer(cors_layer(&state.config.server));
    }

    router.with_state(state)
}

/// CORS for the configured origins; none configured means no cross-origin access
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

/// Signing key used by [`create_router_for_testing`]
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_JWT_SECRET: &str = "roastery-test-signing-key";

/// In-memory application state for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub fn test_state() -> Arc<AppState> {
    let mut config = roastery_core::AppConfig::default();
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();

    match AppState::in_memory(config) {
        Ok(state) => Arc::new(state),
        Err(e) => panic!("test state: {e}"),
    }
}

/// Router over a fresh in-memory state
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_router(test_state())
}
