//! Refresh token issuance, rotation and revocation
//!
//! Refresh tokens are opaque random secrets. The client receives the raw
//! value exactly once; the store only ever sees its SHA-256 digest.
//!
//! Rotation is single use. The presented token is consumed by one atomic
//! store operation before anything else happens, so of two concurrent
//! rotations of the same token at most one can win. The consume step also
//! takes care of cleanup: expired and orphaned records are already gone by
//! the time they are rejected.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use iepf_core::{IepfError, NewRefreshToken, RefreshTokenRepository, User, UserRepository};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Bytes of entropy in every refresh token
pub const TOKEN_BYTE_LENGTH: usize = 48;

/// A refresh token as handed to the client
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// Raw bearer secret; not retrievable again once dropped
    pub token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a successful rotation
#[derive(Debug, Clone)]
pub struct Rotation {
    /// Owner of the consumed token, as currently stored
    pub user: User,
    /// Replacement token
    pub refresh: IssuedRefreshToken,
}

/// Stateful refresh token service
#[derive(Clone)]
pub struct RefreshTokenService {
    tokens: Arc<dyn RefreshTokenRepository>,
    users: Arc<dyn UserRepository>,
    ttl_secs: u64,
}

impl RefreshTokenService {
    pub fn new(
        tokens: Arc<dyn RefreshTokenRepository>,
        users: Arc<dyn UserRepository>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            tokens,
            users,
            ttl_secs,
        }
    }

    /// Issue and persist a new refresh token for `user_id`
    pub async fn issue(&self, user_id: Uuid) -> iepf_core::Result<IssuedRefreshToken> {
        let expires_at = expiry_after(Utc::now(), self.ttl_secs)?;
        let token = generate_refresh_token();

        self.tokens
            .create_token(NewRefreshToken {
                user_id,
                token_hash: hash_refresh_token(&token),
                expires_at,
            })
            .await?;

        Ok(IssuedRefreshToken {
            token,
            expires_in: self.ttl_secs,
            expires_at,
        })
    }

    /// Exchange `raw_token` for a replacement
    ///
    /// Returns `Ok(None)` when the token is unknown, already consumed,
    /// expired, or belongs to a user that no longer exists. Callers must
    /// answer all of those the same way.
    pub async fn rotate(&self, raw_token: &str) -> iepf_core::Result<Option<Rotation>> {
        let token_hash = hash_refresh_token(raw_token);

        // Point of no return: from here on the presented token is dead
        let Some(record) = self.tokens.consume_by_hash(&token_hash).await? else {
            tracing::debug!("Refresh token not found or already consumed");
            return Ok(None);
        };

        if record.is_expired() {
            tracing::debug!(token_id = %record.id, user_id = %record.user_id, "Discarded expired refresh token");
            return Ok(None);
        }

        let Some(user) = self.users.find_by_id(record.user_id).await? else {
            tracing::warn!(token_id = %record.id, user_id = %record.user_id, "Discarded refresh token of missing user");
            return Ok(None);
        };

        let refresh = self.issue(user.id).await?;

        Ok(Some(Rotation { user, refresh }))
    }

    /// Delete every refresh token of `user_id`
    ///
    /// Must run whenever the user's password changes.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> iepf_core::Result<u64> {
        let revoked = self.tokens.delete_by_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "Revoked refresh tokens");
        Ok(revoked)
    }
}

/// `now + ttl_secs`, or an error when the sum does not fit a timestamp
fn expiry_after(now: DateTime<Utc>, ttl_secs: u64) -> iepf_core::Result<DateTime<Utc>> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            IepfError::ConfigError(format!(
                "Refresh token lifetime of {ttl_secs} seconds is out of range"
            ))
        })
}

/// Generate a cryptographically secure refresh token
fn generate_refresh_token() -> String {
    let mut token_bytes = [0u8; TOKEN_BYTE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut token_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Hash a token for storage (SHA-256, lowercase hex)
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
