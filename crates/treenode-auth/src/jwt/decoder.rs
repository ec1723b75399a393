//! Token decoding and verification.
//!
//! Checks run in a fixed order and stop at the first failure: shape,
//! signature, payload, expiry, not-before, and finally revocation.

use std::sync::Arc;

use base64::Engine;

use treenode_core::config::AuthConfig;
use treenode_core::error::AppError;
use treenode_core::traits::Clock;

use crate::error::{AuthError, AuthResult};
use crate::store::RevocationStore;

use super::claims::Claims;
use super::key::SigningKey;
use super::SEGMENT_DECODING;

/// Validates signed tokens.
#[derive(Debug, Clone)]
pub struct TokenDecoder {
    key: SigningKey,
    clock: Arc<dyn Clock>,
}

impl TokenDecoder {
    /// Creates a new decoder. Fails if the secret is not a valid key.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        Ok(Self {
            key: SigningKey::from_config(config)?,
            clock,
        })
    }

    /// Decode and check a token without consulting storage.
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        let mut segments = token.split('.');
        let (header, payload, signature) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(AuthError::MalformedToken),
            };

        let signature = SEGMENT_DECODING
            .decode(signature)
            .map_err(|_| AuthError::InvalidSignature)?;
        let signing_input = &token[..header.len() + 1 + payload.len()];
        if !self.key.verify(signing_input.as_bytes(), &signature) {
            return Err(AuthError::InvalidSignature);
        }

        let payload = SEGMENT_DECODING
            .decode(payload)
            .map_err(|_| AuthError::MalformedPayload)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedPayload)?;

        let now = self.clock.unix_seconds();
        if claims.exp != 0 && now > claims.exp {
            return Err(AuthError::Expired);
        }
        if claims.iat != 0 && now < claims.iat {
            return Err(AuthError::NotYetValid);
        }

        Ok(claims)
    }

    /// Decode, then reject tokens whose id has been revoked.
    ///
    /// The session epoch is not checked here.
    pub async fn verify(
        &self,
        token: &str,
        revocations: &dyn RevocationStore,
    ) -> AuthResult<Claims> {
        let claims = self.decode(token)?;
        if revocations.is_revoked(claims.jti).await? {
            return Err(AuthError::Revoked);
        }
        Ok(claims)
    }
}
