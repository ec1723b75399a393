//! Issuance and redemption of email confirmation and password reset tokens.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use treenode_core::config::AuthConfig;
use treenode_core::traits::Clock;
use treenode_entity::user::User;

use crate::error::{AuthError, AuthResult};
use crate::store::UserStore;

use super::token::OneTimeToken;

/// A redeemed password reset token.
///
/// The reset is only applied by a password change conditioned on
/// `token_hash` still being outstanding.
#[derive(Debug, Clone)]
pub struct Redemption {
    /// The user holding the token.
    pub user: User,
    /// Hash of the redeemed token.
    pub token_hash: String,
}

/// Issues and redeems one-time tokens.
#[derive(Debug, Clone)]
pub struct SecretTokenIssuer {
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    token_bytes: usize,
    confirm_ttl: Duration,
    reset_ttl: Duration,
}

impl SecretTokenIssuer {
    /// Creates an issuer from configuration.
    pub fn new(config: &AuthConfig, users: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            clock,
            token_bytes: config.one_time_token_bytes,
            confirm_ttl: config.email_confirm_ttl(),
            reset_ttl: config.password_reset_ttl(),
        }
    }

    /// Issue a confirmation token, replacing any outstanding one.
    pub async fn issue_email_confirmation(&self, user: &User) -> AuthResult<OneTimeToken> {
        if user.email_confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }

        let token = OneTimeToken::generate(self.token_bytes);
        self.users
            .assign_confirm_token(user.id, &token.hash, self.clock.now())
            .await?;

        info!(user_id = %user.id, "Email confirmation token issued");
        Ok(token)
    }

    /// Issue a reset token for the account with this email, replacing any
    /// outstanding one.
    pub async fn issue_password_reset(&self, email: &str) -> AuthResult<(User, OneTimeToken)> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = OneTimeToken::generate(self.token_bytes);
        self.users
            .assign_reset_token(user.id, &token.hash, self.clock.now())
            .await?;

        info!(user_id = %user.id, "Password reset token issued");
        Ok((user, token))
    }

    /// Look up and time-check a reset token without consuming it.
    pub async fn redeem_password_reset(&self, raw: &str) -> AuthResult<Redemption> {
        let token_hash = OneTimeToken::hash_raw(raw)?;
        let user = self
            .users
            .find_by_reset_token(&token_hash)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        self.check_fresh(user.password_reset_issued_at, self.reset_ttl)?;

        Ok(Redemption { user, token_hash })
    }

    /// Redeem a confirmation token and mark the email confirmed.
    pub async fn confirm_email(&self, raw: &str) -> AuthResult<User> {
        let token_hash = OneTimeToken::hash_raw(raw)?;
        let mut user = self
            .users
            .find_by_confirm_token(&token_hash)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        if user.email_confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }
        self.check_fresh(user.email_confirm_issued_at, self.confirm_ttl)?;

        if !self.users.mark_confirmed(user.id, &token_hash).await? {
            warn!(user_id = %user.id, "Confirmation token consumed concurrently");
            return Err(AuthError::TokenNotFound);
        }

        user.email_confirmed = true;
        user.email_confirm_token = None;
        user.email_confirm_issued_at = None;

        info!(user_id = %user.id, "Email confirmed");
        Ok(user)
    }

    fn check_fresh(&self, issued_at: Option<DateTime<Utc>>, ttl: Duration) -> AuthResult<()> {
        match issued_at {
            Some(issued_at) if issued_at + ttl >= self.clock.now() => Ok(()),
            _ => Err(AuthError::Expired),
        }
    }
}
