//! In-memory store
//!
//! Mirrors the PostgreSQL semantics (unique email, cascade delete, atomic
//! consume) behind a single mutex. Used by the test suites and the
//! `test-utils` router of the API crate.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{NewRefreshToken, NewUser, RefreshTokenRecord, User, UserChanges};
use crate::repository::{RefreshTokenRepository, UserRepository};
use crate::{IepfError, Result};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

/// In-memory implementation of both repositories
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored refresh tokens owned by `user_id`
    pub async fn refresh_token_count(&self, user_id: Uuid) -> usize {
        self.tables
            .lock()
            .await
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.lock().await.users.clone())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(IepfError::duplicate_email());
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let mut tables = self.tables.lock().await;

        if let Some(email) = changes.email.as_deref() {
            if tables.users.iter().any(|u| u.email == email && u.id != id) {
                return Err(IepfError::duplicate_email());
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        // ON DELETE CASCADE
        tables.refresh_tokens.retain(|_, t| t.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStore {
    async fn create_token(&self, token: NewRefreshToken) -> Result<RefreshTokenRecord> {
        let mut tables = self.tables.lock().await;
        if !tables.users.iter().any(|u| u.id == token.user_id) {
            return Err(IepfError::DatabaseError(format!(
                "foreign key violation: user {} does not exist",
                token.user_id
            )));
        }
        if tables.refresh_tokens.contains_key(&token.token_hash) {
            return Err(IepfError::DatabaseError(
                "unique violation on refresh_tokens.token_hash".to_string(),
            ));
        }

        let now = Utc::now();
        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: token.user_id,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            created_at: now,
            updated_at: now,
        };
        tables
            .refresh_tokens
            .insert(record.token_hash.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.refresh_tokens.get(token_hash).cloned())
    }

    async fn consume_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        Ok(self.tables.lock().await.refresh_tokens.remove(token_hash))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.id != id);
        Ok(tables.refresh_tokens.len() < before)
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.user_id != user_id);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}
