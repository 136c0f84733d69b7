//! Authentication service layer
//!
//! Login and refresh flows on top of the password hasher and the two token
//! services. Both flows answer `Ok(None)` for every credential problem so
//! the handlers can return one uniform 401.

use super::jwt::{AccessTokenService, TokenSubject};
use super::password::PasswordHasher;
use super::refresh::{IssuedRefreshToken, RefreshTokenService};
use crate::error::AppError;
use iepf_core::{User, UserRepository};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Token type reported in every token pair
pub const TOKEN_TYPE: &str = "Bearer";

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Access and refresh token returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: u64,
    pub refresh_token: String,
    /// Refresh token lifetime in seconds
    #[schema(example = 604800)]
    pub refresh_token_expires_in: u64,
}

/// A freshly established session
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub tokens: TokenPair,
}

/// Authentication service
pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
    passwords: &'a PasswordHasher,
    access_tokens: &'a AccessTokenService,
    refresh_tokens: &'a RefreshTokenService,
}

impl<'a> AuthService<'a> {
    pub fn new(
        users: &'a dyn UserRepository,
        passwords: &'a PasswordHasher,
        access_tokens: &'a AccessTokenService,
        refresh_tokens: &'a RefreshTokenService,
    ) -> Self {
        Self {
            users,
            passwords,
            access_tokens,
            refresh_tokens,
        }
    }

    /// Login with email and password
    ///
    /// * `Ok(Some(Session))` - Credentials valid, tokens issued
    /// * `Ok(None)` - Unknown email or wrong password; nothing was stored
    /// * `Err(AppError)` - Storage or crypto failure
    pub async fn login(&self, request: &LoginRequest) -> Result<Option<Session>, AppError> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            tracing::debug!("Login for unknown email");
            return Ok(None);
        };

        if !self
            .passwords
            .verify(&user.password_hash, &request.password)
            .await?
        {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Ok(None);
        }

        let refresh = self.refresh_tokens.issue(user.id).await?;
        let tokens = self.token_pair(&user, refresh)?;

        Ok(Some(Session { user, tokens }))
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// The presented token is spent even when the result is `Ok(None)`.
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<Option<Session>, AppError> {
        let Some(rotation) = self.refresh_tokens.rotate(&request.refresh_token).await? else {
            return Ok(None);
        };

        let tokens = self.token_pair(&rotation.user, rotation.refresh)?;

        Ok(Some(Session {
            user: rotation.user,
            tokens,
        }))
    }

    fn token_pair(&self, user: &User, refresh: IssuedRefreshToken) -> Result<TokenPair, AppError> {
        let access = self.access_tokens.issue(TokenSubject {
            id: user.id,
            email: &user.email,
            role: user.role,
        })?;

        Ok(TokenPair {
            access_token: access.token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: access.expires_in,
            refresh_token: refresh.token,
            refresh_token_expires_in: refresh.expires_in,
        })
    }
}
