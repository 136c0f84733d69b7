//! Domain models for user accounts and refresh tokens
//!
//! This module defines the core data structures of the system:
//! - User: account information including the password hash
//! - UserPublic: the sanitized view returned by the API
//! - RefreshTokenRecord: the persisted half of a refresh token
//!
//! These models map to the `users` and `refresh_tokens` tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User role enum
///
/// Defines the access level for a user in the system:
/// - Admin: full access including management of other accounts
/// - User: access to their own account only
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    /// Convert role to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    /// Parse role from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User account model
///
/// Never serialize this type in an API response, use [`UserPublic`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Convert user to public representation (without the password hash)
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a user
///
/// The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Partial update of a user; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// Whether applying these changes rotates the user's password
    pub fn changes_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Persisted refresh token
///
/// Only the SHA-256 digest of the bearer secret is stored; the raw secret
/// exists in memory and in the response to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// A token is expired once `expires_at <= now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Data required to insert a refresh token record
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: "secret_hash".to_string(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_role_conversion() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::User.as_str(), "user");

        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("USER"), Some(UserRole::User));
        assert_eq!(UserRole::parse("editor"), None);
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&UserRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
    }

    #[test]
    fn test_user_to_public_drops_password_hash() {
        let user = sample_user(UserRole::Admin);
        let public = user.to_public();

        assert_eq!(public.id, user.id);
        assert_eq!(public.email, user.email);
        assert_eq!(public.role, UserRole::Admin);

        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("secret_hash"));
        assert!(json.contains("firstName"));
        assert!(json.contains("createdAt"));
    }

    #[test]
    fn test_user_changes() {
        assert!(!UserChanges::default().changes_password());

        let changes = UserChanges {
            first_name: Some("New".to_string()),
            ..Default::default()
        };
        assert!(!changes.changes_password());

        let changes = UserChanges {
            password_hash: Some("hash".to_string()),
            ..Default::default()
        };
        assert!(changes.changes_password());
    }

    #[test]
    fn test_refresh_token_expiry_boundary() {
        let now = Utc::now();
        let mut record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "hash".to_string(),
            expires_at: now + Duration::days(7),
            created_at: now,
            updated_at: now,
        };
        assert!(!record.is_expired_at(now));

        record.expires_at = now;
        assert!(record.is_expired_at(now));

        record.expires_at = now - Duration::seconds(1);
        assert!(record.is_expired());
    }

    proptest::proptest! {
        #[test]
        fn prop_expiry_is_inclusive_of_deadline(offset in -86_400i64..86_400) {
            let now = Utc::now();
            let record = RefreshTokenRecord {
                id: Uuid::nil(),
                user_id: Uuid::nil(),
                token_hash: "hash".to_string(),
                expires_at: now + Duration::seconds(offset),
                created_at: now,
                updated_at: now,
            };
            proptest::prop_assert_eq!(record.is_expired_at(now), offset <= 0);
        }
    }
}
