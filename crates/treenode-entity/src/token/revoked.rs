//! Revoked token record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A token id that must no longer be accepted.
///
/// Revocation is checked by existence. `expires_at` only bounds housekeeping:
/// the record may be purged once the token it names would have expired anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RevokedToken {
    /// The revoked token's `jti`.
    pub jti: Uuid,
    /// Owner of the token.
    pub user_id: Uuid,
    /// The revoked token's own expiry.
    pub expires_at: DateTime<Utc>,
}

impl RevokedToken {
    /// Whether housekeeping may delete this record at `now`.
    ///
    /// Compared in whole seconds, the same resolution token expiry is
    /// checked at: a token stays valid through the second named by `exp`.
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.timestamp() < now.timestamp()
    }
}
