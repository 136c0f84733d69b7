//! Authentication and authorization module
//!
//! This module provides token-based authentication with the following components:
//! - Access token issuance and verification (HS256 JWT)
//! - Refresh token issuance, single-use rotation and revocation
//! - Password hashing with Argon2id
//! - Middleware for request authentication
//! - Authorization policy for user resources
//! - Login and refresh flows

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod refresh;
pub mod service;

pub use jwt::{AccessTokenService, Claims, IssuedAccessToken, JwtError, TokenSubject};
pub use middleware::{auth_middleware, AuthError, AuthenticatedUser};
pub use password::{PasswordConfig, PasswordError, PasswordHasher};
pub use policy::{require_admin, require_self_or_admin, Forbidden};
pub use refresh::{IssuedRefreshToken, RefreshTokenService, Rotation};
pub use service::{AuthService, LoginRequest, RefreshRequest, Session, TokenPair};
