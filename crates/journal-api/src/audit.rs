//! Security audit logging
//!
//! Structured audit events for authentication and authorization decisions.
//! Events go to the `audit` tracing target so they can be routed apart from
//! application logs. Passwords, hashes and tokens are never part of an event.

use chrono::Utc;
use journal_core::UserId;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful login
    LoginSuccess { user_id: UserId, username: String },

    /// Failed login; the reason stays server-side
    LoginFailure { username: String, reason: String },

    /// New account created
    RegistrationSuccess { user_id: UserId, username: String },

    /// Signup rejected
    RegistrationFailure { username: String, reason: String },

    /// Account removed together with its journals
    AccountDeleted {
        user_id: UserId,
        deleted_by: UserId,
    },

    /// A caller touched something that is not theirs
    AccessDenied {
        user_id: UserId,
        resource: String,
    },

    /// Invalid or expired token used
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },
}

/// Log a security audit event with structured fields
///
/// Events are logged at INFO level with the "audit" target. The whole event
/// is also serialized to JSON for log aggregators.
///
/// # Example
///
/// ```ignore
/// audit_log(&AuditEvent::LoginSuccess {
///     user_id: 1,
///     username: "alice".to_string(),
/// });
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
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
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                "Login failed"
            );
        }
        AuditEvent::RegistrationSuccess { user_id, username } => {
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
        AuditEvent::AccountDeleted {
            user_id,
            deleted_by,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                deleted_by = %deleted_by,
                "Account deleted"
            );
        }
        AuditEvent::AccessDenied { user_id, resource } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                resource = %resource,
                "Access denied"
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "Invalid token"
            );
        }
    }
}

/// Extract IP address from request headers
///
/// Checks X-Forwarded-For, then X-Real-IP.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|xff| xff.to_str().ok())
        .and_then(|xff| xff.split(',').next())
    {
        return Some(first_ip.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|ip| ip.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
