//! Caller-identity tokens (HS256).
//!
//! Token issuance (login, OTP flows, refresh) lives in the identity service;
//! this backend only verifies the compact bearer tokens it is handed and
//! extracts `{user_id, role}` from them. The encode path exists for tests
//! and local tooling.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

/// Claims carried by a caller-identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerClaims {
    /// Subject: the caller's user id.
    pub sub: i64,
    /// Caller role (RIDER, DRIVER, ADMIN).
    pub role: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

/// Verifies a bearer token and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<CallerClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 30;

    decode::<CallerClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

/// Issues a short-lived caller token. Test and tooling use only.
pub fn issue_token(
    user_id: i64,
    role: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = CallerClaims {
        sub: user_id,
        role: role.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_round_trip() {
        let token = issue_token(42, "DRIVER", SECRET, 3600).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "DRIVER");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(42, "RIDER", SECRET, 3600).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(42, "RIDER", SECRET, -120).unwrap();
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            verify_token("not.a.token", SECRET),
            Err(TokenError::Invalid)
        ));
    }
}
