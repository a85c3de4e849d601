use crate::error::{AppError, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Bearer token payload. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn new(user_id: Uuid, issued_at: OffsetDateTime, ttl_secs: u64) -> Self {
        let iat = issued_at.unix_timestamp();
        let exp = iat.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX));
        Self { sub: user_id, iat, exp }
    }

    /// Signs the claims with HS256.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if encoding fails.
    pub fn encode(&self, secret: &str) -> Result<String> {
        encode(&Header::default(), self, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            AppError::Internal
        })
    }

    /// Verifies signature and expiry.
    ///
    /// # Errors
    /// Returns `AppError::InvalidToken` for any malformed, tampered or expired token.
    pub fn decode(token: &str, secret: &str) -> Result<Self> {
        let token_data = decode::<Self>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
            .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, OffsetDateTime::now_utc(), 3600);
        let token = claims.encode("test_secret").unwrap();

        let decoded = Claims::decode(&token, "test_secret").unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.exp - decoded.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = Claims::new(Uuid::new_v4(), OffsetDateTime::now_utc(), 3600).encode("a").unwrap();
        assert!(matches!(Claims::decode(&token, "b"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issued = OffsetDateTime::now_utc() - time::Duration::days(2);
        let token = Claims::new(Uuid::new_v4(), issued, 60).encode("secret").unwrap();
        assert!(matches!(Claims::decode(&token, "secret"), Err(AppError::InvalidToken)));
    }
}
