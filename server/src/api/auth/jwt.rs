//! JWT access and refresh tokens

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT validation error
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Wrong token type: expected {expected}")]
    WrongType { expected: TokenType },
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Which half of a token pair a JWT is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: TokenType,
}

impl TokenClaims {
    pub fn new(user_id: &str, token_type: TokenType, ttl: Duration) -> Result<Self, JwtError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::Invalid(format!("token lifetime out of range: {}", ttl)))?;
        Ok(Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

/// Create a signed token
pub fn create_token(
    signing_key: &[u8],
    user_id: &str,
    token_type: TokenType,
    ttl: Duration,
) -> Result<String, JwtError> {
    let claims = TokenClaims::new(user_id, token_type, ttl)?;
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .map_err(|e| JwtError::Invalid(e.to_string()))
}

/// Validate a token and check it is of the expected type
pub fn validate_token(
    token: &str,
    signing_key: &[u8],
    expected: TokenType,
) -> Result<TokenClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data =
        decode::<TokenClaims>(token, &DecodingKey::from_secret(signing_key), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::Invalid(e.to_string()),
            })?;

    if token_data.claims.token_type != expected {
        return Err(JwtError::WrongType { expected });
    }
    Ok(token_data.claims)
}
