//! Caller-identity extractor.
//!
//! Validates the bearer token on a request and resolves it to the small
//! typed `Caller { user_id, role }` record every engine call receives.
//! Token issuance lives in the identity service, not here.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::user::{Caller, Role};

/// Authenticated caller extracted from the Authorization header.
#[derive(Debug, Clone, Copy)]
pub struct AuthCaller(pub Caller);

impl AuthCaller {
    /// The caller, required to be a driver.
    pub fn driver(&self) -> Result<Caller, ApiError> {
        if self.0.role == Role::Driver {
            Ok(self.0)
        } else {
            Err(ApiError::Forbidden("Driver role required".into()))
        }
    }

    /// The caller, required to be a rider.
    pub fn rider(&self) -> Result<Caller, ApiError> {
        if self.0.role == Role::Rider {
            Ok(self.0)
        } else {
            Err(ApiError::Forbidden("Rider role required".into()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                ApiError::Unauthorized("Invalid Authorization header format".to_string())
            })?;

        let claims = shared::token::verify_token(token, &state.config.auth.token_secret)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| ApiError::Unauthorized("Unknown caller role".to_string()))?;

        Ok(AuthCaller(Caller::new(claims.sub, role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_guards() {
        let driver = AuthCaller(Caller::new(7, Role::Driver));
        assert!(driver.driver().is_ok());
        assert!(driver.rider().is_err());

        let rider = AuthCaller(Caller::new(8, Role::Rider));
        assert!(rider.rider().is_ok());
        assert!(rider.driver().is_err());
    }
}
