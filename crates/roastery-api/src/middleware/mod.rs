//! HTTP middleware applied to the whole router
//!
//! Authentication and role checks live in [`crate::auth::middleware`].

pub mod metrics;
pub mod security_headers;

pub use metrics::metrics_middleware;
pub use security_headers::security_headers_middleware;
