//! In-memory stores for single-node deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use treenode_core::error::AppError;
use treenode_core::result::AppResult;
use treenode_entity::lockout::{FailedLogin, FailureOutcome, Lockout};
use treenode_entity::token::RevokedToken;
use treenode_entity::user::User;

use super::{LockoutStore, RevocationStore, UserStore};

#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<Uuid, User>,
    revoked: HashMap<Uuid, RevokedToken>,
    failures: Vec<FailedLogin>,
    lockouts: Vec<Lockout>,
}

impl InnerState {
    fn user_mut(&mut self, user_id: Uuid) -> AppResult<&mut User> {
        self.users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    fn count_recent(&self, user_id: Uuid, origin: &str, since: DateTime<Utc>) -> i64 {
        self.failures
            .iter()
            .filter(|f| {
                f.active && f.user_id == user_id && f.origin == origin && f.attempted_at > since
            })
            .count() as i64
    }
}

/// Implements every store contract in process memory.
///
/// All operations take one Tokio mutex, so each call (including the
/// failure-then-lockout evaluation) is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub async fn insert_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    /// Snapshot of a user.
    pub async fn user(&self, user_id: Uuid) -> Option<User> {
        self.state.lock().await.users.get(&user_id).cloned()
    }

    /// All attempts recorded for a pair, active or not.
    pub async fn failed_logins(&self, user_id: Uuid, origin: &str) -> Vec<FailedLogin> {
        let state = self.state.lock().await;
        state
            .failures
            .iter()
            .filter(|f| f.user_id == user_id && f.origin == origin)
            .cloned()
            .collect()
    }

    /// All lockouts recorded for a pair, active or not.
    pub async fn lockouts(&self, user_id: Uuid, origin: &str) -> Vec<Lockout> {
        let state = self.state.lock().await;
        state
            .lockouts
            .iter()
            .filter(|l| l.user_id == user_id && l.origin == origin)
            .cloned()
            .collect()
    }

    /// Number of revocation records held.
    pub async fn revoked_count(&self) -> usize {
        self.state.lock().await.revoked.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.user(id).await)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_confirm_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email_confirm_token.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.password_reset_token.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn assign_confirm_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state.user_mut(user_id)?;
        user.email_confirm_token = Some(token_hash.to_string());
        user.email_confirm_issued_at = Some(issued_at);
        Ok(())
    }

    async fn assign_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state.user_mut(user_id)?;
        user.password_reset_token = Some(token_hash.to_string());
        user.password_reset_issued_at = Some(issued_at);
        Ok(())
    }

    async fn mark_confirmed(&self, user_id: Uuid, token_hash: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(false);
        };
        if user.email_confirmed || user.email_confirm_token.as_deref() != Some(token_hash) {
            return Ok(false);
        }
        user.email_confirmed = true;
        user.email_confirm_token = None;
        user.email_confirm_issued_at = None;
        Ok(true)
    }

    async fn replace_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        expected_reset_hash: Option<&str>,
        new_epoch: Uuid,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(false);
        };
        if let Some(expected) = expected_reset_hash {
            if user.password_reset_token.as_deref() != Some(expected) {
                return Ok(false);
            }
        }
        user.password_hash = password_hash.to_string();
        user.password_reset_token = None;
        user.password_reset_issued_at = None;
        user.session_epoch = new_epoch;
        Ok(true)
    }
}

#[async_trait]
impl RevocationStore for MemoryStore {
    async fn revoke(&self, record: RevokedToken) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if state.revoked.contains_key(&record.jti) {
            return Ok(false);
        }
        state.revoked.insert(record.jti, record);
        Ok(true)
    }

    async fn is_revoked(&self, jti: Uuid) -> AppResult<bool> {
        Ok(self.state.lock().await.revoked.contains_key(&jti))
    }

    async fn bump_epoch(&self, user_id: Uuid) -> AppResult<Uuid> {
        let mut state = self.state.lock().await;
        let user = state.user_mut(user_id)?;
        user.session_epoch = Uuid::new_v4();
        Ok(user.session_epoch)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.revoked.len();
        state.revoked.retain(|_, record| !record.is_purgeable(now));
        Ok((before - state.revoked.len()) as u64)
    }
}

#[async_trait]
impl LockoutStore for MemoryStore {
    async fn record_failure(&self, attempt: FailedLogin) -> AppResult<()> {
        self.state.lock().await.failures.push(attempt);
        Ok(())
    }

    async fn count_recent_failures(
        &self,
        user_id: Uuid,
        origin: &str,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        Ok(self.state.lock().await.count_recent(user_id, origin, since))
    }

    async fn has_active_lockout(
        &self,
        user_id: Uuid,
        origin: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .lockouts
            .iter()
            .any(|l| l.user_id == user_id && l.origin == origin && l.is_in_force(now)))
    }

    async fn unlock(&self, user_id: Uuid, origin: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for failure in state
            .failures
            .iter_mut()
            .filter(|f| f.user_id == user_id && f.origin == origin)
        {
            failure.active = false;
        }
        for lockout in state
            .lockouts
            .iter_mut()
            .filter(|l| l.user_id == user_id && l.origin == origin)
        {
            lockout.active = false;
        }
        Ok(())
    }

    async fn record_failure_and_evaluate(
        &self,
        attempt: FailedLogin,
        since: DateTime<Utc>,
        threshold: i64,
        candidate: Lockout,
    ) -> AppResult<FailureOutcome> {
        let mut state = self.state.lock().await;
        let (user_id, origin, at) = (attempt.user_id, attempt.origin.clone(), attempt.attempted_at);
        state.failures.push(attempt);

        let recent_failures = state.count_recent(user_id, &origin, since);
        let already_locked = state
            .lockouts
            .iter()
            .any(|l| l.user_id == user_id && l.origin == origin && l.is_in_force(at));
        let lockout = if recent_failures > threshold && !already_locked {
            state.lockouts.push(candidate.clone());
            Some(candidate)
        } else {
            None
        };

        Ok(FailureOutcome {
            recent_failures,
            lockout,
            already_locked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use treenode_entity::user::UserRole;

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = MemoryStore::new();
        let record = RevokedToken {
            jti: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now(),
        };

        assert!(store.revoke(record.clone()).await.unwrap());
        assert!(!store.revoke(record.clone()).await.unwrap());
        assert!(store.is_revoked(record.jti).await.unwrap());
        assert_eq!(store.revoked_count().await, 1);
    }

    #[tokio::test]
    async fn test_purge_keeps_unexpired_records() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let expired = RevokedToken {
            jti: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: now - Duration::seconds(1),
        };
        let live = RevokedToken {
            jti: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: now + Duration::seconds(1),
        };
        store.revoke(expired.clone()).await.unwrap();
        store.revoke(live.clone()).await.unwrap();

        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert!(!store.is_revoked(expired.jti).await.unwrap());
        assert!(store.is_revoked(live.jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_bump_epoch_unknown_user() {
        let store = MemoryStore::new();
        assert!(store.bump_epoch(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn test_replace_password_requires_outstanding_reset() {
        let store = MemoryStore::new();
        let mut user = User::new("alice", "alice@example.com", "old", UserRole::User);
        user.password_reset_token = Some("reset-hash".into());
        let id = user.id;
        store.insert_user(user).await;

        let epoch = Uuid::new_v4();
        assert!(!store.replace_password(id, "new", Some("other"), epoch).await.unwrap());
        assert!(store.replace_password(id, "new", Some("reset-hash"), epoch).await.unwrap());
        assert!(!store.replace_password(id, "newer", Some("reset-hash"), epoch).await.unwrap());

        let user = store.user(id).await.unwrap();
        assert_eq!(user.password_hash, "new");
        assert_eq!(user.session_epoch, epoch);
        assert!(user.password_reset_token.is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_ignores_case() {
        let store = MemoryStore::new();
        store
            .insert_user(User::new("alice", "Alice@Example.com", "h", UserRole::User))
            .await;
        assert!(store.find_by_email("alice@example.COM").await.unwrap().is_some());
    }
}
