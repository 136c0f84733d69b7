//! Authentication middleware for protecting routes
//!
//! Extracts and validates the bearer token from the Authorization header.
//! On success, adds the authenticated identity to request extensions.

use super::jwt::{Claims, JwtError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use iepf_core::UserRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Authenticated user information extracted from the access token
///
/// This is added to request extensions by the auth middleware
/// and can be extracted in handlers using `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// User's unique identifier
    pub id: Uuid,
    /// User's email address
    pub email: String,
    /// User's role
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)?;
        let role = UserRole::parse(&claims.role).ok_or(JwtError::InvalidToken)?;

        Ok(Self {
            id,
            email: claims.email,
            role,
        })
    }
}

/// Reasons a request fails authentication
///
/// Only used for logging and tests; every variant produces the same response.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "message": "Unauthorized" });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Pull the token out of `Authorization: <scheme> <token>`
///
/// The scheme is matched case-insensitively against `bearer`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if scheme.is_empty() || token.is_empty() || !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Authentication middleware that requires a valid access token
///
/// This middleware:
/// 1. Extracts the Authorization header
/// 2. Validates the Bearer token format
/// 3. Validates the token signature, expiry, issuer and claims
/// 4. Adds AuthenticatedUser to request extensions
///
/// # Usage
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use iepf_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
///
/// In handlers, extract the user:
///
/// ```
/// use axum::Extension;
/// use iepf_api::auth::middleware::AuthenticatedUser;
///
/// async fn protected_handler(
///     Extension(user): Extension<AuthenticatedUser>
/// ) -> String {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    match authenticate(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address: extract_ip_address(request.headers()),
                user_agent: extract_user_agent(request.headers()),
                reason: e.to_string(),
            });
            Err(e)
        }
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = state.access_tokens.verify(token)?;
    Ok(AuthenticatedUser::try_from(claims)?)
}
