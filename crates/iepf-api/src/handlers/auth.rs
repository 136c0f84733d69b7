//! Authentication API handlers
//!
//! Login and refresh. Every credential problem answers the same 401 so a
//! client cannot tell an unknown email from a wrong password, or a spent
//! refresh token from an expired one.

use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::auth::{LoginRequest, RefreshRequest};
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use std::sync::Arc;

/// Login with email and password
///
/// Authenticates a user and returns an access token plus a single-use
/// refresh token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = crate::auth::TokenPair),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 422, description = "Invalid input", body = crate::error::ValidationErrorResponse),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    match state.auth_service().login(&request).await? {
        Some(session) => {
            audit_log(&AuditEvent::LoginSuccess {
                user_id: session.user.id,
                email: session.user.email.clone(),
                ip_address,
                user_agent,
            });
            Ok(Json(session.tokens))
        }
        None => {
            audit_log(&AuditEvent::LoginFailure {
                email: request.email,
                reason: "Invalid credentials".to_string(),
                ip_address,
                user_agent,
            });
            Err(AppError::Unauthorized)
        }
    }
}

/// Exchange a refresh token for a new token pair
///
/// The presented refresh token is consumed whether or not the exchange
/// succeeds.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated tokens", body = crate::auth::TokenPair),
        (status = 401, description = "Invalid refresh token", body = crate::error::ApiError),
        (status = 422, description = "Invalid input", body = crate::error::ValidationErrorResponse),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip_address = extract_ip_address(&headers);
    let user_agent = extract_user_agent(&headers);

    match state.auth_service().refresh(&request).await? {
        Some(session) => {
            audit_log(&AuditEvent::TokenRefresh {
                user_id: session.user.id,
                email: session.user.email.clone(),
                ip_address,
                user_agent,
            });
            Ok(Json(session.tokens))
        }
        None => {
            audit_log(&AuditEvent::RefreshRejected {
                ip_address,
                user_agent,
            });
            Err(AppError::Unauthorized)
        }
    }
}
