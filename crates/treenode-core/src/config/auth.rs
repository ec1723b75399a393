//! Authentication configuration.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Minimum size of the decoded HMAC signing secret (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

/// Minimum random bytes in a one-time token.
pub const MIN_ONE_TIME_TOKEN_BYTES: usize = 16;

/// Upper bound for any configured lifetime or window (ten years).
pub const MAX_WINDOW_SECONDS: i64 = 10 * 365 * 86_400;

/// Rejects a lifetime outside `1..=MAX_WINDOW_SECONDS`.
pub(crate) fn check_window(name: &str, seconds: i64) -> Result<(), AppError> {
    if !(1..=MAX_WINDOW_SECONDS).contains(&seconds) {
        return Err(AppError::configuration(format!(
            "{name} must be between 1 and {MAX_WINDOW_SECONDS} seconds, got {seconds}"
        )));
    }
    Ok(())
}

/// Token signing, token lifetimes, and one-time token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base64 (standard alphabet) HMAC-SHA256 signing secret.
    pub jwt_secret: String,
    /// Credential (session) token TTL in seconds.
    #[serde(default = "default_credential_ttl")]
    pub credential_ttl_seconds: i64,
    /// Refresh token TTL in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_seconds: i64,
    /// Email confirmation token TTL in seconds.
    #[serde(default = "default_email_confirm_ttl")]
    pub email_confirm_ttl_seconds: i64,
    /// Password reset token TTL in seconds.
    #[serde(default = "default_password_reset_ttl")]
    pub password_reset_ttl_seconds: i64,
    /// Random bytes in each one-time token.
    #[serde(default = "default_one_time_token_bytes")]
    pub one_time_token_bytes: usize,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Whether `X-Forwarded-For` / `X-Real-IP` identify the client origin.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl AuthConfig {
    /// Creates a configuration with default lifetimes around the given secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            credential_ttl_seconds: default_credential_ttl(),
            refresh_ttl_seconds: default_refresh_ttl(),
            email_confirm_ttl_seconds: default_email_confirm_ttl(),
            password_reset_ttl_seconds: default_password_reset_ttl(),
            one_time_token_bytes: default_one_time_token_bytes(),
            password_min_length: default_password_min(),
            trust_proxy_headers: false,
        }
    }

    /// Checks the secret, every lifetime, and the one-time token size.
    pub fn validate(&self) -> Result<(), AppError> {
        self.signing_key()?;

        check_window("auth.credential_ttl_seconds", self.credential_ttl_seconds)?;
        check_window("auth.refresh_ttl_seconds", self.refresh_ttl_seconds)?;
        check_window("auth.email_confirm_ttl_seconds", self.email_confirm_ttl_seconds)?;
        check_window("auth.password_reset_ttl_seconds", self.password_reset_ttl_seconds)?;

        if self.one_time_token_bytes < MIN_ONE_TIME_TOKEN_BYTES {
            return Err(AppError::configuration(format!(
                "auth.one_time_token_bytes must be at least {MIN_ONE_TIME_TOKEN_BYTES}, got {}",
                self.one_time_token_bytes
            )));
        }

        Ok(())
    }

    /// Decodes the signing secret, enforcing the minimum key size.
    pub fn signing_key(&self) -> Result<Vec<u8>, AppError> {
        let bytes = STANDARD
            .decode(self.jwt_secret.trim())
            .map_err(|e| AppError::configuration(format!("Invalid jwt_secret encoding: {e}")))?;

        if bytes.len() < MIN_SECRET_BYTES {
            return Err(AppError::configuration(format!(
                "jwt_secret must decode to at least {MIN_SECRET_BYTES} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(bytes)
    }

    /// Credential token lifetime.
    pub fn credential_ttl(&self) -> Duration {
        Duration::seconds(self.credential_ttl_seconds)
    }

    /// Refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_ttl_seconds)
    }

    /// Email confirmation token lifetime.
    pub fn email_confirm_ttl(&self) -> Duration {
        Duration::seconds(self.email_confirm_ttl_seconds)
    }

    /// Password reset token lifetime.
    pub fn password_reset_ttl(&self) -> Duration {
        Duration::seconds(self.password_reset_ttl_seconds)
    }
}

fn default_credential_ttl() -> i64 {
    900
}

fn default_refresh_ttl() -> i64 {
    129_600
}

fn default_email_confirm_ttl() -> i64 {
    86_400
}

fn default_password_reset_ttl() -> i64 {
    3600
}

fn default_one_time_token_bytes() -> usize {
    16
}

fn default_password_min() -> usize {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_accepts_256_bit_secret() {
        let secret = STANDARD.encode([7u8; 32]);
        let config = AuthConfig::with_secret(secret);
        assert_eq!(config.signing_key().unwrap().len(), 32);
    }

    #[test]
    fn test_signing_key_rejects_short_secret() {
        let secret = STANDARD.encode([7u8; 31]);
        let err = AuthConfig::with_secret(secret).signing_key().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_validate_rejects_degenerate_lifetimes() {
        let secret = STANDARD.encode([7u8; 32]);
        assert!(AuthConfig::with_secret(secret.clone()).validate().is_ok());

        for ttl in [0, -1, MAX_WINDOW_SECONDS + 1, i64::MAX] {
            let mut config = AuthConfig::with_secret(secret.clone());
            config.credential_ttl_seconds = ttl;
            assert!(config.validate().is_err(), "credential ttl {ttl} accepted");

            let mut config = AuthConfig::with_secret(secret.clone());
            config.password_reset_ttl_seconds = ttl;
            assert!(config.validate().is_err(), "reset ttl {ttl} accepted");
        }
    }

    #[test]
    fn test_validate_rejects_short_one_time_tokens() {
        let mut config = AuthConfig::with_secret(STANDARD.encode([7u8; 32]));
        config.one_time_token_bytes = 0;
        assert!(config.validate().is_err());
        config.one_time_token_bytes = MIN_ONE_TIME_TOKEN_BYTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_signing_key_rejects_non_base64() {
        assert!(AuthConfig::with_secret("not base64 !!").signing_key().is_err());
    }
}
