//! Authentication manager

use anyhow::Result;
use chrono::Duration;

use super::jwt::{JwtError, TokenClaims, TokenType, create_token, validate_token};
use crate::core::SecretManager;
use crate::core::config::AuthConfig;

/// Access and refresh token issued together at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and validates bearer tokens
#[derive(Debug)]
pub struct AuthManager {
    signing_key: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthManager {
    /// Load the signing key and token lifetimes
    pub async fn init(secrets: &SecretManager, config: &AuthConfig) -> Result<Self> {
        let signing_key = secrets.get_jwt_signing_key().await?;
        tracing::debug!(
            access_minutes = config.access_token_minutes,
            refresh_days = config.refresh_token_days,
            "Token signing ready"
        );
        Ok(Self::new(
            signing_key,
            config.access_token_minutes,
            config.refresh_token_days,
        ))
    }

    pub fn new(signing_key: Vec<u8>, access_minutes: u32, refresh_days: u32) -> Self {
        Self {
            signing_key,
            access_ttl: Duration::minutes(i64::from(access_minutes)),
            refresh_ttl: Duration::days(i64::from(refresh_days)),
        }
    }

    /// Issue a fresh access/refresh pair for a user
    pub fn issue(&self, user_id: &str) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access: create_token(&self.signing_key, user_id, TokenType::Access, self.access_ttl)?,
            refresh: create_token(
                &self.signing_key,
                user_id,
                TokenType::Refresh,
                self.refresh_ttl,
            )?,
        })
    }

    /// Exchange a refresh token for a new access token
    pub fn refresh(&self, refresh_token: &str) -> Result<(TokenClaims, String), JwtError> {
        let claims = validate_token(refresh_token, &self.signing_key, TokenType::Refresh)?;
        let access = create_token(
            &self.signing_key,
            claims.user_id(),
            TokenType::Access,
            self.access_ttl,
        )?;
        Ok((claims, access))
    }

    /// Validate a bearer access token
    pub fn validate_access(&self, jwt: &str) -> Result<TokenClaims, JwtError> {
        validate_token(jwt, &self.signing_key, TokenType::Access)
    }
}
