//! Revocation storage contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use treenode_core::result::AppResult;
use treenode_entity::token::RevokedToken;

/// Per-token revocation and per-user session epochs.
#[async_trait]
pub trait RevocationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Record a revoked token id.
    ///
    /// Returns `false` if the id was already revoked; that is not an error.
    async fn revoke(&self, record: RevokedToken) -> AppResult<bool>;

    /// Whether the token id has been revoked.
    async fn is_revoked(&self, jti: Uuid) -> AppResult<bool>;

    /// Assign the user a fresh random session epoch and return it.
    async fn bump_epoch(&self, user_id: Uuid) -> AppResult<Uuid>;

    /// Delete records whose token expired before `now`. Returns the count.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
