//! Token issuance.

use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use treenode_core::config::AuthConfig;
use treenode_core::error::AppError;
use treenode_core::traits::Clock;
use treenode_entity::token::TokenKind;
use treenode_entity::user::User;

use super::claims::Claims;
use super::key::SigningKey;
use super::SEGMENT_ENCODING;

/// JOSE header shared by every token.
const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// A signed token together with the claims it carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Compact serialization.
    pub token: String,
    /// Claims that were signed.
    pub claims: Claims,
    /// Expiry as a timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Credential and refresh tokens minted from the same user snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived credential token.
    pub credential: IssuedToken,
    /// Long-lived refresh token.
    pub refresh: IssuedToken,
}

/// Signs claims and issues tokens with configured lifetimes.
#[derive(Debug, Clone)]
pub struct TokenEncoder {
    key: SigningKey,
    credential_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenEncoder {
    /// Creates a new encoder. Fails if the secret is not a valid key.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        Ok(Self {
            key: SigningKey::from_config(config)?,
            credential_ttl: config.credential_ttl(),
            refresh_ttl: config.refresh_ttl(),
            clock,
        })
    }

    /// Lifetime of tokens of `kind`.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Credential => self.credential_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Serialize and sign `claims` as `header.payload.signature`.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        let header = SEGMENT_ENCODING.encode(HEADER_JSON);
        let payload = SEGMENT_ENCODING.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{header}.{payload}");
        let signature = SEGMENT_ENCODING.encode(self.key.sign(signing_input.as_bytes())?);
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Issue a token of `kind` stamped with the user's current epoch.
    pub fn issue(&self, user: &User, kind: TokenKind) -> Result<IssuedToken, AppError> {
        let iat = self.clock.unix_seconds();
        let exp = iat + self.ttl(kind).num_seconds();

        let claims = Claims {
            sub: user.id,
            jti: Uuid::new_v4(),
            sid: user.session_epoch,
            iat,
            exp,
            email: user.email.clone(),
            role: user.role,
            kind,
        };

        let token = self.sign(&claims)?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AppError::internal(format!("Token expiry out of range: {exp}")))?;

        Ok(IssuedToken {
            token,
            claims,
            expires_at,
        })
    }

    /// Issue a credential and a refresh token for the same user snapshot.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            credential: self.issue(user, TokenKind::Credential)?,
            refresh: self.issue(user, TokenKind::Refresh)?,
        })
    }
}
