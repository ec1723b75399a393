//! User storage contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use treenode_core::result::AppResult;
use treenode_entity::user::User;

/// Reads and credential-related writes on user accounts.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by email, ignoring case.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find the user whose outstanding confirmation token has this hash.
    async fn find_by_confirm_token(&self, token_hash: &str) -> AppResult<Option<User>>;

    /// Find the user whose outstanding reset token has this hash.
    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<User>>;

    /// Replace the confirmation token hash and issue time.
    async fn assign_confirm_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Replace the reset token hash and issue time.
    async fn assign_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Mark the email confirmed and clear the token, only while `token_hash`
    /// is still outstanding and the email is unconfirmed.
    async fn mark_confirmed(&self, user_id: Uuid, token_hash: &str) -> AppResult<bool>;

    /// Atomically write the password hash, clear the reset token and set the
    /// session epoch. With `expected_reset_hash`, applies only while that
    /// reset token is outstanding.
    async fn replace_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        expected_reset_hash: Option<&str>,
        new_epoch: Uuid,
    ) -> AppResult<bool>;
}
