//! JWT access tokens (HS256, shared secret).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::config::JwtConfig;

/// JWT service for token generation and validation.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime_hours: i64,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Email.
    pub email: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// JWT ID.
    pub jti: String,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            token_lifetime_hours: config.token_lifetime_hours,
        }
    }

    pub fn issue_access_token(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + Duration::hours(self.token_lifetime_hours)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to sign token: {e}")))
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::AuthError(anyhow::anyhow!("Invalid token: {e}")))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "test-secret".to_string(),
            token_lifetime_hours: 1,
        })
    }

    #[test]
    fn issued_tokens_validate() {
        let jwt = service();
        let user_id = Uuid::new_v4();
        let token = jwt.issue_access_token(user_id, "user@example.com").unwrap();
        let claims = jwt.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "user@example.com");
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let jwt = service();
        let token = jwt
            .issue_access_token(Uuid::new_v4(), "user@example.com")
            .unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        assert!(jwt.validate_access_token(&tampered).is_err());
    }
}
