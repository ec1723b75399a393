//! Failed login attempt row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One failed credential check for a (user, origin) pair.
///
/// Rows are never updated individually; unlocking the pair deactivates all
/// of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FailedLogin {
    /// Row identifier.
    pub id: Uuid,
    /// The account the attempt targeted.
    pub user_id: Uuid,
    /// Client address the attempt came from.
    pub origin: String,
    /// When the attempt happened.
    pub attempted_at: DateTime<Utc>,
    /// Cleared by unlock.
    pub active: bool,
}

impl FailedLogin {
    /// A new active attempt recorded at `at`.
    pub fn new(user_id: Uuid, origin: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            origin: origin.into(),
            attempted_at: at,
            active: true,
        }
    }
}
