//! Failed-login storage contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use treenode_core::result::AppResult;
use treenode_entity::lockout::{FailedLogin, FailureOutcome, Lockout};

/// Failed login attempts and lockouts, keyed by (user, origin).
#[async_trait]
pub trait LockoutStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a failed attempt.
    async fn record_failure(&self, attempt: FailedLogin) -> AppResult<()>;

    /// Count active attempts for the pair with `attempted_at > since`.
    async fn count_recent_failures(
        &self,
        user_id: Uuid,
        origin: &str,
        since: DateTime<Utc>,
    ) -> AppResult<i64>;

    /// Whether an active lockout for the pair has `locked_until > now`.
    async fn has_active_lockout(
        &self,
        user_id: Uuid,
        origin: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Deactivate every attempt and lockout for the pair, all or nothing.
    async fn unlock(&self, user_id: Uuid, origin: &str) -> AppResult<()>;

    /// Insert `attempt`, count the pair's active attempts after `since`, and
    /// insert `candidate` when the count exceeds `threshold` and no lockout
    /// for the pair is in force at `attempt.attempted_at`.
    ///
    /// Runs as one unit serialised per pair; concurrent failures never
    /// observe each other's partial effects.
    async fn record_failure_and_evaluate(
        &self,
        attempt: FailedLogin,
        since: DateTime<Utc>,
        threshold: i64,
        candidate: Lockout,
    ) -> AppResult<FailureOutcome>;
}
