//! Access token generation and validation
//!
//! Implements JWT-based access tokens with HMAC-SHA256 signing. Tokens are
//! self-contained: verification needs the shared secret only, never the
//! database, and there is no revocation list. Compromise is bounded by the
//! short TTL.

use iepf_core::{AuthConfig, UserRole, TOKEN_ISSUER};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure containing user information
///
/// These claims are embedded in the access token and extracted during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer (always "iepf-api")
    pub iss: String,
    /// Subject - user ID
    #[serde(default)]
    pub sub: String,
    /// JWT ID - unique per issuance
    #[serde(default)]
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// User's email address
    #[serde(default)]
    pub email: String,
    /// User's role (user, admin)
    #[serde(default)]
    pub role: String,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token is missing required claim `{0}`")]
    MissingClaim(&'static str),

    #[error("Token lifetime of {0} seconds is out of range")]
    TtlOutOfRange(u64),

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// Identity carried by an access token
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub role: UserRole,
}

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Stateless access token signer and verifier
#[derive(Clone)]
pub struct AccessTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl AccessTokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_secs: config.access_token_ttl_secs,
        }
    }

    /// Sign an access token for `subject`
    ///
    /// `exp` is always `iat + ttl` and every call gets a fresh `jti`, so two
    /// tokens minted in the same second for the same user still differ.
    pub fn issue(&self, subject: TokenSubject<'_>) -> Result<IssuedAccessToken, JwtError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let exp = now
            .checked_add(self.ttl_secs)
            .filter(|exp| i64::try_from(*exp).is_ok())
            .ok_or(JwtError::TtlOutOfRange(self.ttl_secs))?;

        let claims = Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: subject.id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp,
            email: subject.email.to_string(),
            role: subject.role.as_str().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedAccessToken {
            token,
            expires_in: self.ttl_secs,
        })
    }

    /// Validate a token and extract its claims
    ///
    /// Fails when the signature is invalid, the token is expired, the issuer
    /// differs, or any of `sub`, `email`, `role`, `exp`, `jti` is missing.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            },
        )?;

        let claims = token_data.claims;
        if claims.sub.is_empty() {
            return Err(JwtError::MissingClaim("sub"));
        }
        if claims.email.is_empty() {
            return Err(JwtError::MissingClaim("email"));
        }
        if claims.role.is_empty() {
            return Err(JwtError::MissingClaim("role"));
        }
        if claims.jti.is_empty() {
            return Err(JwtError::MissingClaim("jti"));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            password_salt: "pepper".to_string(),
            ..Default::default()
        }
    }

    fn service() -> AccessTokenService {
        AccessTokenService::new(&config("test-secret-key-with-at-least-32-bytes"))
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sign_raw(claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"test-secret-key-with-at-least-32-bytes"),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_token() {
        let service = service();
        let user_id = Uuid::new_v4();

        let issued = service
            .issue(TokenSubject {
                id: user_id,
                email: "test@example.com",
                role: UserRole::Admin,
            })
            .expect("Failed to issue token");
        assert_eq!(issued.expires_in, 3600);

        let claims = service.verify(&issued.token).expect("Failed to verify token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, "iepf-api");
        assert_eq!(claims.exp, claims.iat + 3600);
        assert!(Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let service = AccessTokenService::new(&AuthConfig {
            access_token_ttl_secs: u64::MAX,
            ..config("test-secret-key-with-at-least-32-bytes")
        });

        let result = service.issue(TokenSubject {
            id: Uuid::new_v4(),
            email: "test@example.com",
            role: UserRole::User,
        });

        assert!(matches!(result, Err(JwtError::TtlOutOfRange(u64::MAX))));
    }

    #[test]
    fn test_each_issuance_has_unique_jti() {
        let service = service();
        let subject = TokenSubject {
            id: Uuid::new_v4(),
            email: "test@example.com",
            role: UserRole::User,
        };

        let first = service.issue(subject).unwrap();
        let second = service.issue(subject).unwrap();
        assert_ne!(first.token, second.token);

        let a = service.verify(&first.token).unwrap();
        let b = service.verify(&second.token).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_invalid_token() {
        let result = service().verify("invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let one = AccessTokenService::new(&config("secret-one-secret-one-secret-one-1"));
        let two = AccessTokenService::new(&config("secret-two-secret-two-secret-two-2"));

        let issued = one
            .issue(TokenSubject {
                id: Uuid::new_v4(),
                email: "test@example.com",
                role: UserRole::User,
            })
            .unwrap();

        let result = two.verify(&issued.token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token() {
        let now = now();
        let token = sign_raw(&serde_json::json!({
            "iss": TOKEN_ISSUER,
            "sub": Uuid::new_v4().to_string(),
            "jti": Uuid::new_v4().to_string(),
            "iat": now - 7200,
            "exp": now - 3600,
            "email": "test@example.com",
            "role": "user",
        }));

        let result = service().verify(&token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let now = now();
        let token = sign_raw(&serde_json::json!({
            "iss": "someone-else",
            "sub": Uuid::new_v4().to_string(),
            "jti": Uuid::new_v4().to_string(),
            "iat": now,
            "exp": now + 3600,
            "email": "test@example.com",
            "role": "user",
        }));

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn test_missing_claims_rejected() {
        let now = now();
        for missing in ["sub", "email", "role", "jti", "exp"] {
            let mut claims = serde_json::json!({
                "iss": TOKEN_ISSUER,
                "sub": Uuid::new_v4().to_string(),
                "jti": Uuid::new_v4().to_string(),
                "iat": now,
                "exp": now + 3600,
                "email": "test@example.com",
                "role": "user",
            });
            claims.as_object_mut().unwrap().remove(missing);

            let result = service().verify(&sign_raw(&claims));
            assert!(result.is_err(), "token without `{missing}` was accepted");
        }
    }
}
