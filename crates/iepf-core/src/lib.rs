//! iepf Core - Domain models, persistence ports and shared types
//!
//! This crate defines the pieces shared by the API server and the CLI:
//! - User and refresh-token models
//! - Repository traits for users and refresh tokens
//! - PostgreSQL and in-memory repository implementations
//! - Common error types
//! - Configuration management

pub mod config;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use config::{
    AdminSeedConfig, AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig,
    ServerConfig, TOKEN_ISSUER,
};
pub use memory::InMemoryStore;
pub use models::{
    NewRefreshToken, NewUser, RefreshTokenRecord, User, UserChanges, UserPublic, UserRole,
};
pub use postgres::PgStore;
pub use repository::{RefreshTokenRepository, UserRepository};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for iepf operations
#[derive(Error, Debug)]
pub enum IepfError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write (e.g. duplicate email)
    #[error("Conflict on {field}: {message}")]
    Conflict { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IepfError {
    /// Conflict raised when an email address is already registered
    pub fn duplicate_email() -> Self {
        Self::Conflict {
            field: "email".to_string(),
            message: "A user with this email already exists".to_string(),
        }
    }
}

impl From<sqlx::Error> for IepfError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IepfError>;
