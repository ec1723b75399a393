//! Periodic purge of expired revocation records.
//!
//! A revocation record is only useful while the token it names could still
//! pass the expiry check, so records past their token's expiry are deleted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use treenode_core::traits::Clock;

use crate::error::AuthResult;
use crate::store::RevocationStore;

/// Deletes revocation records whose tokens have expired.
#[derive(Debug, Clone)]
pub struct RevocationCleanup {
    store: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
}

impl RevocationCleanup {
    /// Creates a new cleanup handler.
    pub fn new(store: Arc<dyn RevocationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Runs one purge. Returns the number of records removed.
    pub async fn run_cleanup(&self) -> AuthResult<u64> {
        let removed = self.store.purge_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(removed = removed, "Purged expired revocation records");
        } else {
            debug!("No expired revocation records");
        }
        Ok(removed)
    }

    /// Purge every `interval` until `shutdown` flips to `true` or its
    /// sender is dropped. A failed purge is logged and retried next tick.
    pub fn spawn(self, interval: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_cleanup().await {
                            error!(error = %e, "Revocation cleanup failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Revocation cleanup stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use treenode_core::traits::ManualClock;
    use treenode_entity::token::RevokedToken;
    use uuid::Uuid;

    use crate::store::MemoryStore;

    fn record(expires_in: i64, clock: &ManualClock) -> RevokedToken {
        RevokedToken {
            jti: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: clock.now() + chrono::Duration::seconds(expires_in),
        }
    }

    #[tokio::test]
    async fn test_run_cleanup_removes_only_expired() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        store.revoke(record(-10, &clock)).await.unwrap();
        let live = record(10, &clock);
        store.revoke(live.clone()).await.unwrap();

        let cleanup = RevocationCleanup::new(Arc::new(store.clone()), Arc::new(clock));
        assert_eq!(cleanup.run_cleanup().await.unwrap(), 1);
        assert_eq!(store.revoked_count().await, 1);
        assert!(store.is_revoked(live.jti).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_stops_on_shutdown() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc::now());
        store.revoke(record(-10, &clock)).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = RevocationCleanup::new(Arc::new(store.clone()), Arc::new(clock))
            .spawn(Duration::from_secs(60), rx);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.revoked_count().await, 0);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
