//! Lockout policy over a (user, origin) pair.
//!
//! Every failed credential check is recorded. When the number of active
//! failures inside the backtrack window exceeds the threshold, the pair is
//! locked for the configured duration. Lockouts lapse on their own but stay
//! active until an explicit unlock, which also clears the failure history.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use treenode_core::config::LockoutConfig;
use treenode_core::traits::Clock;
use treenode_entity::lockout::{FAILED_LOGINS_REASON, FailedLogin, FailureOutcome, Lockout};

use crate::error::AuthResult;
use crate::store::LockoutStore;

/// Decides whether a (user, origin) pair may attempt a login.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    store: Arc<dyn LockoutStore>,
    clock: Arc<dyn Clock>,
    threshold: i64,
    duration: Duration,
    backtrack: Duration,
}

impl LockoutPolicy {
    /// Creates a policy from configuration.
    pub fn new(config: &LockoutConfig, store: Arc<dyn LockoutStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            threshold: config.threshold,
            duration: config.duration(),
            backtrack: config.backtrack(),
        }
    }

    /// Record one failed attempt without evaluating the threshold.
    pub async fn record_failure(&self, user_id: Uuid, origin: &str) -> AuthResult<()> {
        let attempt = FailedLogin::new(user_id, origin, self.clock.now());
        self.store.record_failure(attempt).await?;
        Ok(())
    }

    /// Active failures for the pair inside the backtrack window.
    pub async fn recent_failure_count(&self, user_id: Uuid, origin: &str) -> AuthResult<i64> {
        let since = self.clock.now() - self.backtrack;
        Ok(self
            .store
            .count_recent_failures(user_id, origin, since)
            .await?)
    }

    /// Whether an active lockout for the pair is still in force.
    pub async fn is_locked_out(&self, user_id: Uuid, origin: &str) -> AuthResult<bool> {
        Ok(self
            .store
            .has_active_lockout(user_id, origin, self.clock.now())
            .await?)
    }

    /// Deactivate all failures and lockouts for the pair.
    pub async fn unlock(&self, user_id: Uuid, origin: &str) -> AuthResult<()> {
        self.store.unlock(user_id, origin).await?;
        info!(user_id = %user_id, origin = %origin, "Login pair unlocked");
        Ok(())
    }

    /// Record a failed login and lock the pair if it crossed the threshold.
    ///
    /// Recording and the lockout decision happen as one unit in the store.
    pub async fn register_failure(&self, user_id: Uuid, origin: &str) -> AuthResult<FailureOutcome> {
        let now = self.clock.now();
        let attempt = FailedLogin::new(user_id, origin, now);
        let candidate = Lockout::new(user_id, origin, now + self.duration, FAILED_LOGINS_REASON);

        let outcome = self
            .store
            .record_failure_and_evaluate(attempt, now - self.backtrack, self.threshold, candidate)
            .await?;

        match &outcome.lockout {
            Some(lockout) => warn!(
                user_id = %user_id,
                origin = %origin,
                failures = outcome.recent_failures,
                locked_until = %lockout.locked_until,
                "Login pair locked after repeated failures"
            ),
            None if outcome.already_locked => info!(
                user_id = %user_id,
                origin = %origin,
                failures = outcome.recent_failures,
                "Failed login on locked pair"
            ),
            None => info!(
                user_id = %user_id,
                origin = %origin,
                failures = outcome.recent_failures,
                "Failed login recorded"
            ),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use treenode_core::traits::ManualClock;

    use crate::store::MemoryStore;

    fn policy() -> (LockoutPolicy, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        let policy = LockoutPolicy::new(
            &LockoutConfig::default(),
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
        );
        (policy, store, clock)
    }

    #[tokio::test]
    async fn test_sixth_failure_locks() {
        let (policy, _, _) = policy();
        let user = Uuid::new_v4();

        for expected in 1..=5 {
            let outcome = policy.register_failure(user, "10.0.0.1").await.unwrap();
            assert_eq!(outcome.recent_failures, expected);
            assert!(!outcome.locked());
        }
        assert!(!policy.is_locked_out(user, "10.0.0.1").await.unwrap());

        let outcome = policy.register_failure(user, "10.0.0.1").await.unwrap();
        assert!(outcome.locked());
        assert!(policy.is_locked_out(user, "10.0.0.1").await.unwrap());
        assert!(!policy.is_locked_out(user, "10.0.0.2").await.unwrap());
    }

    #[tokio::test]
    async fn test_failures_outside_window_do_not_count() {
        let (policy, _, clock) = policy();
        let user = Uuid::new_v4();

        for _ in 0..5 {
            policy.record_failure(user, "10.0.0.1").await.unwrap();
        }
        clock.advance(Duration::seconds(1800));
        assert_eq!(policy.recent_failure_count(user, "10.0.0.1").await.unwrap(), 0);

        let outcome = policy.register_failure(user, "10.0.0.1").await.unwrap();
        assert_eq!(outcome.recent_failures, 1);
        assert!(!outcome.locked());
    }

    #[tokio::test]
    async fn test_lockout_lapses_but_stays_active() {
        let (policy, store, clock) = policy();
        let user = Uuid::new_v4();

        for _ in 0..6 {
            policy.register_failure(user, "10.0.0.1").await.unwrap();
        }
        clock.advance(Duration::seconds(3600));

        assert!(!policy.is_locked_out(user, "10.0.0.1").await.unwrap());
        let lockouts = store.lockouts(user, "10.0.0.1").await;
        assert_eq!(lockouts.len(), 1);
        assert!(lockouts[0].active);
        assert_eq!(lockouts[0].reason, "failed logins");
    }

    #[tokio::test]
    async fn test_concurrent_failures_lock_exactly_once() {
        let (policy, store, _) = policy();
        let user = Uuid::new_v4();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..20 {
            let policy = policy.clone();
            tasks.spawn(async move { policy.register_failure(user, "10.0.0.1").await });
        }

        let mut counts = Vec::new();
        let mut created = 0;
        while let Some(result) = tasks.join_next().await {
            let outcome = result.unwrap().unwrap();
            counts.push(outcome.recent_failures);
            if outcome.lockout.is_some() {
                created += 1;
                assert_eq!(outcome.recent_failures, 6);
            }
            assert_eq!(outcome.locked(), outcome.recent_failures > 5);
        }

        counts.sort_unstable();
        assert_eq!(counts, (1..=20).collect::<Vec<i64>>());
        assert_eq!(created, 1);
        assert_eq!(store.lockouts(user, "10.0.0.1").await.len(), 1);
        assert!(policy.is_locked_out(user, "10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_after_lapse_locks_again() {
        let (policy, store, clock) = policy();
        let user = Uuid::new_v4();

        for _ in 0..6 {
            policy.register_failure(user, "10.0.0.1").await.unwrap();
        }
        let outcome = policy.register_failure(user, "10.0.0.1").await.unwrap();
        assert!(outcome.locked());
        assert!(outcome.lockout.is_none());

        clock.advance(Duration::seconds(3600));
        for _ in 0..5 {
            assert!(!policy.register_failure(user, "10.0.0.1").await.unwrap().locked());
        }
        let outcome = policy.register_failure(user, "10.0.0.1").await.unwrap();
        assert!(outcome.lockout.is_some());
        assert_eq!(store.lockouts(user, "10.0.0.1").await.len(), 2);
    }

    #[tokio::test]
    async fn test_unlock_clears_history() {
        let (policy, store, _) = policy();
        let user = Uuid::new_v4();

        for _ in 0..6 {
            policy.register_failure(user, "10.0.0.1").await.unwrap();
        }
        policy.unlock(user, "10.0.0.1").await.unwrap();

        assert!(!policy.is_locked_out(user, "10.0.0.1").await.unwrap());
        assert_eq!(policy.recent_failure_count(user, "10.0.0.1").await.unwrap(), 0);
        assert!(store.failed_logins(user, "10.0.0.1").await.iter().all(|f| !f.active));
    }
}
