//! Security audit logging for authentication events
//!
//! Provides structured audit logging for logins, token refreshes, session
//! revocations and access control failures.
//!
//! All audit events are logged at INFO level with the "audit" target,
//! making them easy to filter and route to security monitoring systems.
//! Raw tokens and passwords never appear in an event.
//!
//! # Example
//!
//! ```ignore
//! use iepf_api::audit::{AuditEvent, audit_log};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     email: user.email.clone(),
//!     ip_address: Some("192.168.1.1".to_string()),
//!     user_agent: Some("Mozilla/5.0...".to_string()),
//! });
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user login
    LoginSuccess {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed login attempt
    LoginFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Refresh token exchanged for a new pair
    TokenRefresh {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Refresh token unknown, consumed, expired or orphaned
    RefreshRejected {
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// All refresh tokens of a user deleted after a password change
    SessionsRevoked {
        user_id: Uuid,
        revoked: u64,
        changed_by: Uuid,
    },

    /// Access denied due to insufficient permissions
    AccessDenied {
        user_id: Option<Uuid>,
        email: Option<String>,
        resource: String,
        required_role: Option<String>,
    },

    /// Missing, malformed, invalid or expired bearer token
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    /// Account created by an administrator
    UserCreated {
        user_id: Uuid,
        email: String,
        role: String,
        created_by: Uuid,
    },

    /// Account deleted by an administrator
    UserDeleted { user_id: Uuid, deleted_by: Uuid },
}

/// Log a security audit event with structured fields
///
/// The event is also serialized to JSON under the `event` field for log
/// aggregators. Example output:
///
/// ```json
/// {
///   "event_type": "login_success",
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "email": "user@example.com",
///   "ip_address": "192.168.1.1",
///   "user_agent": "Mozilla/5.0..."
/// }
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess {
            user_id,
            email,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            email,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                reason = %reason,
                ip_address = ?ip_address,
                "Login failed"
            );
        }
        AuditEvent::TokenRefresh {
            user_id,
            email,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                ip_address = ?ip_address,
                "Token refreshed"
            );
        }
        AuditEvent::RefreshRejected { ip_address, .. } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                "Refresh token rejected"
            );
        }
        AuditEvent::SessionsRevoked {
            user_id,
            revoked,
            changed_by,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                revoked = %revoked,
                changed_by = %changed_by,
                "Sessions revoked after password change"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            email,
            resource,
            required_role,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = ?user_id,
                email = ?email,
                resource = %resource,
                required_role = ?required_role,
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
        AuditEvent::UserCreated {
            user_id,
            email,
            role,
            created_by,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                email = %email,
                role = %role,
                created_by = %created_by,
                "User created"
            );
        }
        AuditEvent::UserDeleted {
            user_id,
            deleted_by,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                deleted_by = %deleted_by,
                "User deleted"
            );
        }
    }
}

/// Extract the client IP address from proxy headers
///
/// Checks X-Forwarded-For, then X-Real-IP.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    // First entry of the chain is the client
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
