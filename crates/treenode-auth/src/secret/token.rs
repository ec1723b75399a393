//! Random one-time token with its storage hash.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{AuthError, AuthResult};
use crate::jwt::SEGMENT_DECODING;

/// A freshly generated one-time token.
///
/// `raw` goes to the user out of band; only `hash` is stored.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeToken {
    /// URL-safe base64 of the random bytes.
    pub raw: String,
    /// URL-safe base64 of SHA-256 over the random bytes.
    pub hash: String,
}

impl fmt::Debug for OneTimeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneTimeToken")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

impl OneTimeToken {
    /// Draw `byte_len` bytes from the OS random source.
    pub fn generate(byte_len: usize) -> Self {
        let mut bytes = vec![0u8; byte_len];
        OsRng.fill_bytes(&mut bytes);
        Self {
            raw: URL_SAFE.encode(&bytes),
            hash: digest(&bytes),
        }
    }

    /// Recompute the storage hash of a presented raw token.
    ///
    /// A value that is not URL-safe base64 cannot match any stored token.
    pub fn hash_raw(raw: &str) -> AuthResult<String> {
        let bytes = SEGMENT_DECODING
            .decode(raw.trim())
            .map_err(|_| AuthError::TokenNotFound)?;
        Ok(digest(&bytes))
    }
}

fn digest(bytes: &[u8]) -> String {
    URL_SAFE.encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let token = OneTimeToken::generate(16);
        assert_eq!(token.raw.len(), 24);
        assert_eq!(token.hash.len(), 44);
        assert_ne!(token.raw, token.hash);
    }

    #[test]
    fn test_hash_raw_matches_generated() {
        let token = OneTimeToken::generate(16);
        assert_eq!(OneTimeToken::hash_raw(&token.raw).unwrap(), token.hash);
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(OneTimeToken::generate(16).raw, OneTimeToken::generate(16).raw);
    }

    #[test]
    fn test_garbage_raw_is_not_found() {
        assert!(matches!(OneTimeToken::hash_raw("%%%"), Err(AuthError::TokenNotFound)));
    }

    #[test]
    fn test_debug_omits_raw() {
        let token = OneTimeToken::generate(16);
        assert!(!format!("{token:?}").contains(&token.raw));
    }
}
