//! Security audit logging for authentication events
//!
//! All audit events are logged at INFO level (WARN for denials) with the
//! "audit" target, so they can be filtered and routed separately from
//! application logs.
//!
//! # Example
//!
//! ```ignore
//! use roastery_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     username: user.username.clone(),
//! });
//! ```

use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user registration
    RegistrationSuccess {
        user_id: Uuid,
        username: String,
        email: String,
    },

    /// Rejected registration
    RegistrationFailure { username: String, reason: String },

    /// Successful user login
    LoginSuccess { user_id: Uuid, username: String },

    /// Failed login attempt; the reason is never returned to the client
    LoginFailure { username: String, reason: String },

    /// Refresh token exchanged for a new token pair
    TokenRefresh { user_id: Uuid },

    /// Refresh rejected
    TokenRefreshFailure { reason: String },

    /// Refresh token revoked by its owner
    TokenRevoked {
        user_id: Uuid,
        revoked: bool,
        reason: String,
    },

    /// Invalid or expired access token presented
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    /// Access denied due to insufficient permissions
    AccessDenied {
        user_id: Uuid,
        resource: String,
        required_role: Option<String>,
    },
}

/// Log a security audit event with structured fields
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::RegistrationSuccess {
            user_id, username, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                "Registration successful"
            );
        }
        AuditEvent::RegistrationFailure { username, reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                "Registration failed"
            );
        }
        AuditEvent::LoginSuccess { user_id, username } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure { username, reason } => {
            warn!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                "Login failed"
            );
        }
        AuditEvent::TokenRefresh { user_id } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                "Token refresh"
            );
        }
        AuditEvent::TokenRefreshFailure { reason } => {
            warn!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                reason = %reason,
                "Token refresh rejected"
            );
        }
        AuditEvent::TokenRevoked {
            user_id, revoked, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                revoked = %revoked,
                "Refresh token revocation"
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            warn!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "Invalid token"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            resource,
            required_role,
        } => {
            warn!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                resource = %resource,
                required_role = ?required_role,
                "Access denied"
            );
        }
    }
}

/// Extract the client IP address from proxy headers
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

/// Extract the User-Agent header
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
