//! Password hashing and verification using Argon2id
//!
//! Every password is prefixed with the configured `PASSWORD_SALT` before it
//! reaches Argon2 (a server-side pepper). The PHC string still carries its
//! own 16-byte random salt.
//!
//! Hashing is CPU bound, so the async entry points run it on the blocking
//! thread pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params,
};
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Password task was cancelled: {0}")]
    TaskFailed(String),
}

/// Password hashing configuration
///
/// These parameters are tuned for security while maintaining acceptable performance.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism (threads, default: 4)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    /// Cheap parameters for test suites
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    /// Create Argon2 parameters from this configuration
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// One-way hash + verify capability
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    pepper: String,
    config: PasswordConfig,
}

impl PasswordHasher {
    pub fn new(pepper: impl Into<String>) -> Self {
        Self::with_config(pepper, PasswordConfig::default())
    }

    pub fn with_config(pepper: impl Into<String>, config: PasswordConfig) -> Self {
        Self {
            pepper: pepper.into(),
            config,
        }
    }

    fn peppered(&self, password: &str) -> String {
        format!("{}{}", self.pepper, password)
    }

    /// Hash a plaintext password, returning a PHC string
    pub fn hash_blocking(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let params = self.config.to_params()?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let password_hash = argon2
            .hash_password(self.peppered(password).as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verify a plaintext password against a stored PHC string
    ///
    /// * `Ok(true)` - Password matches
    /// * `Ok(false)` - Password does not match
    /// * `Err(PasswordError)` - The stored hash is unreadable
    pub fn verify_blocking(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

        // Parameters are read back from the PHC string
        let argon2 = Argon2::default();

        match argon2.verify_password(self.peppered(password).as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
        }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let hasher = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
    }

    pub async fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        let hash = hash.to_string();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_blocking(&hash, &password))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
    }
}
