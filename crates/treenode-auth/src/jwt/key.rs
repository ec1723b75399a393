//! HMAC-SHA256 signing key.

use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use treenode_core::config::AuthConfig;
use treenode_core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Shared secret used to sign and verify tokens.
///
/// Cloning shares the key bytes. The bytes never appear in `Debug` output.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Arc<[u8]>,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SigningKey {
    /// Decode and validate the configured secret.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Ok(Self {
            bytes: config.signing_key()?.into(),
        })
    }

    /// HMAC-SHA256 over `input`.
    pub fn sign(&self, input: &[u8]) -> Result<Vec<u8>, AppError> {
        let mut mac = self.mac()?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Constant-time check of `signature` against `input`.
    pub fn verify(&self, input: &[u8], signature: &[u8]) -> bool {
        match self.mac() {
            Ok(mut mac) => {
                mac.update(input);
                mac.verify_slice(signature).is_ok()
            }
            Err(_) => false,
        }
    }

    fn mac(&self) -> Result<HmacSha256, AppError> {
        HmacSha256::new_from_slice(&self.bytes)
            .map_err(|e| AppError::internal(format!("Invalid HMAC key: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SigningKey {
        SigningKey::from_config(&AuthConfig::with_secret(
            "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=",
        ))
        .unwrap()
    }

    #[test]
    fn test_sign_then_verify() {
        let key = key();
        let signature = key.sign(b"header.payload").unwrap();
        assert_eq!(signature.len(), 32);
        assert!(key.verify(b"header.payload", &signature));
        assert!(!key.verify(b"header.payloaD", &signature));
        assert!(!key.verify(b"header.payload", &signature[..31]));
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", key());
        assert!(!rendered.contains("0123456789abcdef"));
        assert!(rendered.contains("len: 32"));
    }
}
