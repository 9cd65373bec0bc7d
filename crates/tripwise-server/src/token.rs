//! Session tokens and password hashing.
//!
//! Tokens are HS256 JWTs carrying `{userId, iat, exp}`.

use crate::config::AuthConfig;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("invalid token lifetime: {0:?}")]
    Lifetime(String),
    #[error("JWT_SECRET is not configured")]
    MissingSecret,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Parses a lifetime such as `"7d"`, `"12h"`, `"30m"`, `"45s"` or a bare
/// number of seconds.
pub fn parse_lifetime(value: &str) -> Result<Duration, TokenError> {
    let value = value.trim();
    let invalid = || TokenError::Lifetime(value.to_string());
    let (digits, unit) = match value.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&value[..i], c),
        Some(_) => (value, 's'),
        None => return Err(invalid()),
    };
    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let scale: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        'w' => 7 * 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    // Must also fit the signed `exp` claim.
    let secs = amount
        .checked_mul(scale)
        .filter(|secs| *secs > 0 && i64::try_from(*secs).is_ok())
        .ok_or_else(invalid)?;
    Ok(Duration::from_secs(secs))
}

/// Signing keys and token lifetime derived from [`AuthConfig`].
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        if config.jwt_secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self::new(
            config.jwt_secret.as_bytes(),
            parse_lifetime(&config.jwt_expires_in)?,
        ))
    }

    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    /// Issues a token for `user_id` valid from now.
    pub fn issue(&self, user_id: &str) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let exp = i64::try_from(self.lifetime.as_secs())
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or_else(|| TokenError::Lifetime(format!("{}s", self.lifetime.as_secs())))?;
        let claims = Claims {
            user_id: user_id.to_string(),
            iat,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// Hashes a password with the configured bcrypt cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Checks a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
