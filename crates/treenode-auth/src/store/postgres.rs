//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use treenode_core::error::AppError;
use treenode_core::result::AppResult;
use treenode_database::DatabasePool;
use treenode_database::repositories::{LockoutRepository, RevokedTokenRepository, UserRepository};
use treenode_entity::lockout::{FailedLogin, FailureOutcome, Lockout};
use treenode_entity::token::RevokedToken;
use treenode_entity::user::User;

use super::{LockoutStore, RevocationStore, UserStore};

/// Implements every store contract over the repositories.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    users: UserRepository,
    revoked: RevokedTokenRepository,
    lockouts: LockoutRepository,
}

impl PostgresStore {
    /// Creates the store on top of a connected pool.
    pub fn new(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            users: UserRepository::new(pool.clone()),
            revoked: RevokedTokenRepository::new(pool.clone()),
            lockouts: LockoutRepository::new(pool),
        }
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn find_by_confirm_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        self.users.find_by_confirm_token(token_hash).await
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        self.users.find_by_reset_token(token_hash).await
    }

    async fn assign_confirm_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.users
            .set_confirm_token(user_id, token_hash, issued_at)
            .await
    }

    async fn assign_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.users.set_reset_token(user_id, token_hash, issued_at).await
    }

    async fn mark_confirmed(&self, user_id: Uuid, token_hash: &str) -> AppResult<bool> {
        self.users.mark_confirmed(user_id, token_hash).await
    }

    async fn replace_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        expected_reset_hash: Option<&str>,
        new_epoch: Uuid,
    ) -> AppResult<bool> {
        self.users
            .replace_password(user_id, password_hash, expected_reset_hash, new_epoch)
            .await
    }
}

#[async_trait]
impl RevocationStore for PostgresStore {
    async fn revoke(&self, record: RevokedToken) -> AppResult<bool> {
        self.revoked.insert(&record).await
    }

    async fn is_revoked(&self, jti: Uuid) -> AppResult<bool> {
        self.revoked.exists(jti).await
    }

    async fn bump_epoch(&self, user_id: Uuid) -> AppResult<Uuid> {
        self.users
            .bump_epoch(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.revoked.delete_expired(now).await
    }
}

#[async_trait]
impl LockoutStore for PostgresStore {
    async fn record_failure(&self, attempt: FailedLogin) -> AppResult<()> {
        self.lockouts.insert_failure(&attempt).await
    }

    async fn count_recent_failures(
        &self,
        user_id: Uuid,
        origin: &str,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        self.lockouts
            .count_failures_since(user_id, origin, since)
            .await
    }

    async fn has_active_lockout(
        &self,
        user_id: Uuid,
        origin: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.lockouts.has_active_lockout(user_id, origin, now).await
    }

    async fn unlock(&self, user_id: Uuid, origin: &str) -> AppResult<()> {
        self.lockouts.unlock(user_id, origin).await
    }

    async fn record_failure_and_evaluate(
        &self,
        attempt: FailedLogin,
        since: DateTime<Utc>,
        threshold: i64,
        candidate: Lockout,
    ) -> AppResult<FailureOutcome> {
        self.lockouts
            .record_failure_and_evaluate(&attempt, since, threshold, candidate)
            .await
    }
}
