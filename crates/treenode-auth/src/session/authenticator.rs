//! Session authentication flows.
//!
//! Every flow that accepts a signed token goes through [`SessionAuthenticator::authenticate`]:
//! signature, lifetime and revocation are checked by the decoder, then the
//! user is reloaded and the token's kind and session epoch are compared with
//! the stored state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use treenode_core::config::AppConfig;
use treenode_core::error::AppError;
use treenode_core::traits::Clock;
use treenode_entity::token::{RevokedToken, TokenKind};
use treenode_entity::user::User;

use crate::error::{AuthError, AuthResult};
use crate::jwt::{Claims, TokenDecoder, TokenEncoder, TokenPair};
use crate::lockout::LockoutPolicy;
use crate::password::{PasswordHasher, PasswordValidator};
use crate::secret::SecretTokenIssuer;
use crate::store::{LockoutStore, RevocationStore, UserStore};

/// A successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    /// The authenticated user.
    pub user: User,
    /// Fresh credential and refresh tokens.
    pub tokens: TokenPair,
}

/// Orchestrates login, token authentication, refresh, logout and password
/// changes.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationStore>,
    encoder: TokenEncoder,
    decoder: TokenDecoder,
    lockout: LockoutPolicy,
    secrets: SecretTokenIssuer,
    hasher: PasswordHasher,
    validator: PasswordValidator,
}

impl SessionAuthenticator {
    /// Wires the authenticator over separate stores.
    pub fn new(
        config: &AppConfig,
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
        lockouts: Arc<dyn LockoutStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            encoder: TokenEncoder::new(&config.auth, clock.clone())?,
            decoder: TokenDecoder::new(&config.auth, clock.clone())?,
            lockout: LockoutPolicy::new(&config.lockout, lockouts, clock.clone()),
            secrets: SecretTokenIssuer::new(&config.auth, users.clone(), clock),
            hasher: PasswordHasher::new(),
            validator: PasswordValidator::new(&config.auth),
            users,
            revocations,
        })
    }

    /// Wires the authenticator over one store implementing every contract.
    pub fn with_store<S>(config: &AppConfig, store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Self, AppError>
    where
        S: UserStore + RevocationStore + LockoutStore,
    {
        Self::new(config, store.clone(), store.clone(), store, clock)
    }

    /// The token encoder.
    pub fn encoder(&self) -> &TokenEncoder {
        &self.encoder
    }

    /// The token decoder.
    pub fn decoder(&self) -> &TokenDecoder {
        &self.decoder
    }

    /// The lockout policy.
    pub fn lockout(&self) -> &LockoutPolicy {
        &self.lockout
    }

    /// The one-time token issuer.
    pub fn secrets(&self) -> &SecretTokenIssuer {
        &self.secrets
    }

    /// Resolve a token of `expected` kind to its user.
    pub async fn authenticate(&self, token: &str, expected: TokenKind) -> AuthResult<User> {
        let (_, user) = self.authenticate_claims(token, expected).await?;
        Ok(user)
    }

    async fn authenticate_claims(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> AuthResult<(Claims, User)> {
        let claims = self.decoder.verify(token, self.revocations.as_ref()).await?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if claims.kind != expected {
            return Err(AuthError::WrongKind);
        }
        if claims.sid != user.session_epoch {
            return Err(AuthError::EpochMismatch);
        }

        Ok((claims, user))
    }

    /// Check email and password from `origin` and issue a token pair.
    ///
    /// A locked pair is refused before the password is looked at. Unconfirmed
    /// accounts are refused after a correct password with the same error as
    /// a wrong one.
    pub async fn login(&self, email: &str, password: &str, origin: &str) -> AuthResult<LoginResult> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!(origin = %origin, "Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if self.lockout.is_locked_out(user.id, origin).await? {
            warn!(user_id = %user.id, origin = %origin, "Login refused: pair locked");
            return Err(AuthError::LockedOut);
        }

        if !self.hasher.verify_password(password, &user.password_hash)? {
            let outcome = self.lockout.register_failure(user.id, origin).await?;
            if outcome.locked() {
                return Err(AuthError::LockedOut);
            }
            warn!(user_id = %user.id, origin = %origin, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.email_confirmed {
            warn!(user_id = %user.id, "Login refused: email not confirmed");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.encoder.issue_pair(&user)?;
        info!(user_id = %user.id, origin = %origin, "Login successful");

        Ok(LoginResult { user, tokens })
    }

    /// Exchange a refresh token for a new pair. Each refresh token works once.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let (claims, user) = self
            .authenticate_claims(refresh_token, TokenKind::Refresh)
            .await?;

        if !self.revocations.revoke(revocation_record(&claims)).await? {
            warn!(user_id = %user.id, jti = %claims.jti, "Refresh token already consumed");
            return Err(AuthError::Revoked);
        }

        // Reload so the new pair reflects any change since the old one was issued.
        let user = self
            .users
            .find_by_id(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let tokens = self.encoder.issue_pair(&user)?;
        info!(user_id = %user.id, "Session refreshed");
        Ok(tokens)
    }

    /// Revoke the presented credential token and, if it belongs to the same
    /// user, the presented refresh token.
    pub async fn logout(&self, credential_token: &str, refresh_token: Option<&str>) -> AuthResult<()> {
        let (claims, user) = self
            .authenticate_claims(credential_token, TokenKind::Credential)
            .await?;
        self.revocations.revoke(revocation_record(&claims)).await?;

        if let Some(refresh_token) = refresh_token {
            match self.decoder.decode(refresh_token) {
                Ok(refresh) if refresh.sub == user.id && refresh.kind == TokenKind::Refresh => {
                    self.revocations.revoke(revocation_record(&refresh)).await?;
                }
                Ok(_) => warn!(user_id = %user.id, "Ignoring refresh token of another user"),
                Err(reason) => info!(user_id = %user.id, reason = %reason, "Ignoring unusable refresh token"),
            }
        }

        info!(user_id = %user.id, jti = %claims.jti, "User logged out");
        Ok(())
    }

    /// Invalidate every token issued to the user so far.
    pub async fn logout_everywhere(&self, credential_token: &str) -> AuthResult<Uuid> {
        let user = self.authenticate(credential_token, TokenKind::Credential).await?;
        let epoch = self.revocations.bump_epoch(user.id).await?;
        info!(user_id = %user.id, "User logged out everywhere");
        Ok(epoch)
    }

    /// Change the password of a signed-in user after checking the old one.
    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
        origin: &str,
    ) -> AuthResult<()> {
        if !self.hasher.verify_password(old_password, &user.password_hash)? {
            warn!(user_id = %user.id, "Password change refused: wrong current password");
            return Err(AuthError::InvalidCredentials);
        }

        if !self.apply_new_password(user, new_password, None, origin).await? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    /// Set a new password using a reset token. The token works once.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
        origin: &str,
    ) -> AuthResult<User> {
        let redemption = self.secrets.redeem_password_reset(raw_token).await?;

        let applied = self
            .apply_new_password(&redemption.user, new_password, Some(&redemption.token_hash), origin)
            .await?;
        if !applied {
            warn!(user_id = %redemption.user.id, "Reset token consumed concurrently");
            return Err(AuthError::TokenNotFound);
        }

        self.users
            .find_by_id(redemption.user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn apply_new_password(
        &self,
        user: &User,
        new_password: &str,
        expected_reset_hash: Option<&str>,
        origin: &str,
    ) -> AuthResult<bool> {
        self.validator.validate(new_password)?;
        if self.hasher.verify_password(new_password, &user.password_hash)? {
            return Err(AuthError::InvalidPassword(
                "new password must differ from the current password".into(),
            ));
        }

        let hash = self.hasher.hash_password(new_password)?;
        let applied = self
            .users
            .replace_password(user.id, &hash, expected_reset_hash, Uuid::new_v4())
            .await?;
        if !applied {
            return Ok(false);
        }

        self.lockout.unlock(user.id, origin).await?;
        info!(user_id = %user.id, origin = %origin, "Password changed");
        Ok(true)
    }
}

/// Revocation record that lives as long as the token itself.
fn revocation_record(claims: &Claims) -> RevokedToken {
    RevokedToken {
        jti: claims.jti,
        user_id: claims.sub,
        expires_at: claims.expires_at().unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}
