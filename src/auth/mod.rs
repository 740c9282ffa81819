pub mod password;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::User;

/// Token payload. Field names match what browser clients already decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: &User, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            exp: (issued_at + ttl).timestamp(),
            iat: issued_at.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT expiry must be between 1 and 87600 hours, got {0}")]
    InvalidExpiry(u64),
}

/// Ten years; keeps `iat + ttl` well inside chrono's range
pub const MAX_EXPIRY_HOURS: u64 = 24 * 365 * 10;

/// Issues and verifies HS256 bearer tokens with a fixed lifetime
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        let ttl = i64::try_from(expiry_hours)
            .ok()
            .filter(|h| (1..=MAX_EXPIRY_HOURS as i64).contains(h))
            .and_then(Duration::try_hours)
            .ok_or(TokenError::InvalidExpiry(expiry_hours))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a fresh token for `user`, valid from now for the configured lifetime
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.sign(&Claims::new(user, Utc::now(), self.ttl))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Check signature and expiry, returning the decoded claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(is_admin: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "grace".to_string(),
            email: "grace@example.com".to_string(),
            phone: "5550001111".to_string(),
            password: "hash".to_string(),
            is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(matches!(TokenService::new("", 720), Err(TokenError::InvalidSecret)));
    }

    #[test]
    fn rejects_out_of_range_expiry() {
        for hours in [0, MAX_EXPIRY_HOURS + 1, 10_000_000_000_000_000, u64::MAX] {
            assert!(
                matches!(TokenService::new("secret", hours), Err(TokenError::InvalidExpiry(h)) if h == hours),
                "{hours} hours should be rejected"
            );
        }
        let longest = TokenService::new("secret", MAX_EXPIRY_HOURS).unwrap();
        assert_eq!(longest.ttl(), Duration::hours(MAX_EXPIRY_HOURS as i64));
    }

    #[test]
    fn issued_token_carries_identity() {
        let tokens = TokenService::new("secret", 720).unwrap();
        let user = user(true);
        let claims = tokens.verify(&tokens.issue(&user).unwrap()).unwrap();

        assert_eq!(claims.user_id, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("secret", 720).unwrap();
        let issued = Utc::now() - Duration::days(31);
        let token = tokens.sign(&Claims::new(&user(false), issued, tokens.ttl())).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let ours = TokenService::new("secret", 720).unwrap();
        let theirs = TokenService::new("other", 720).unwrap();
        let token = theirs.issue(&user(false)).unwrap();

        assert!(ours.verify(&token).is_err());
        assert!(ours.verify("not-a-jwt").is_err());
    }

    #[test]
    fn claims_use_camel_case_names() {
        let claims = Claims::new(&user(false), Utc::now(), Duration::hours(1));
        let value = serde_json::to_value(&claims).unwrap();
        assert!(value.get("userId").is_some());
        assert!(value.get("isAdmin").is_some());
    }
}
