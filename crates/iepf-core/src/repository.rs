//! Persistence ports for users and refresh tokens
//!
//! The API server only talks to storage through these traits so the same
//! services run against PostgreSQL in production and the in-memory store in
//! tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewRefreshToken, NewUser, RefreshTokenRecord, User, UserChanges};
use crate::Result;

/// Trait for user account storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// List every user, oldest first
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Insert a user
    ///
    /// Fails with [`crate::IepfError::Conflict`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Apply a partial update; `Ok(None)` when the user does not exist
    ///
    /// Fails with [`crate::IepfError::Conflict`] when the new email is taken.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>>;

    /// Delete a user and, by cascade, its refresh tokens
    ///
    /// Returns `false` when no user matched.
    async fn delete_user(&self, id: Uuid) -> Result<bool>;
}

/// Trait for refresh token storage
///
/// Records are looked up by the digest of the bearer secret, never by the
/// secret itself.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create_token(&self, token: NewRefreshToken) -> Result<RefreshTokenRecord>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>>;

    /// Atomically delete the record matching `token_hash` and return it
    ///
    /// Concurrent callers presenting the same hash race on a single row
    /// deletion: at most one of them receives `Some`.
    async fn consume_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>>;

    async fn delete_by_id(&self, id: Uuid) -> Result<bool>;

    /// Delete every token owned by the user, returning the number removed
    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64>;
}
