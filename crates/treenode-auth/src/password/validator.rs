//! Password policy enforcement for new passwords.

use treenode_core::config::AuthConfig;

use crate::error::{AuthError, AuthResult};

/// Validates new passwords against the configured policy.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Checks length and character classes, reporting the first violation.
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.min_length {
            return Err(AuthError::InvalidPassword(format!(
                "password must be at least {} characters long",
                self.min_length
            )));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AuthError::InvalidPassword(
                "password must contain at least one lowercase letter".into(),
            ));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AuthError::InvalidPassword(
                "password must contain at least one uppercase letter".into(),
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::InvalidPassword(
                "password must contain at least one digit".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PasswordValidator {
        PasswordValidator::new(&AuthConfig::with_secret(""))
    }

    #[test]
    fn test_accepts_policy_password() {
        assert!(validator().validate("Abcdefg1").is_ok());
    }

    #[test]
    fn test_rejections() {
        let v = validator();
        for bad in ["Abcde1", "abcdefg1", "ABCDEFG1", "Abcdefgh"] {
            assert!(matches!(v.validate(bad), Err(AuthError::InvalidPassword(_))), "{bad}");
        }
    }
}
