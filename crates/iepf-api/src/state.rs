//! Application state management

use crate::auth::jwt::AccessTokenService;
use crate::auth::password::{PasswordConfig, PasswordHasher};
use crate::auth::refresh::RefreshTokenService;
use crate::auth::service::AuthService;
use iepf_core::config::AppConfig;
use iepf_core::{RefreshTokenRepository, UserRepository};
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// User storage
    pub users: Arc<dyn UserRepository>,
    /// Password hashing with the configured pepper
    pub passwords: PasswordHasher,
    /// Access token signer and verifier
    pub access_tokens: AccessTokenService,
    /// Refresh token issuance, rotation and revocation
    pub refresh_tokens: RefreshTokenService,
}

impl AppState {
    /// Create new application state over the given stores
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn RefreshTokenRepository>,
    ) -> Self {
        Self::with_password_config(config, users, tokens, PasswordConfig::default())
    }

    /// Like [`AppState::new`] with explicit Argon2 parameters
    pub fn with_password_config(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn RefreshTokenRepository>,
        password_config: PasswordConfig,
    ) -> Self {
        let passwords =
            PasswordHasher::with_config(config.auth.password_salt.clone(), password_config);
        let access_tokens = AccessTokenService::new(&config.auth);
        let refresh_tokens =
            RefreshTokenService::new(tokens, users.clone(), config.auth.refresh_token_ttl_secs);

        Self {
            config,
            users,
            passwords,
            access_tokens,
            refresh_tokens,
        }
    }

    /// Login and refresh flows over this state's services
    pub fn auth_service(&self) -> AuthService<'_> {
        AuthService::new(
            self.users.as_ref(),
            &self.passwords,
            &self.access_tokens,
            &self.refresh_tokens,
        )
    }
}
