//! Failed login and lockout repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use treenode_core::error::{AppError, ErrorKind};
use treenode_core::result::AppResult;
use treenode_entity::lockout::{FailedLogin, FailureOutcome, Lockout};

/// Repository for the `failed_logins` and `lockouts` tables.
#[derive(Debug, Clone)]
pub struct LockoutRepository {
    pool: PgPool,
}

impl LockoutRepository {
    /// Create a new lockout repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a failed login attempt.
    pub async fn insert_failure(&self, attempt: &FailedLogin) -> AppResult<()> {
        let mut conn = self.acquire().await?;
        insert_failure(&mut conn, attempt).await
    }

    /// Count active attempts for the pair after `since`.
    pub async fn count_failures_since(
        &self,
        user_id: Uuid,
        origin: &str,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        let mut conn = self.acquire().await?;
        count_failures_since(&mut conn, user_id, origin, since).await
    }

    /// Whether an active lockout for the pair runs past `now`.
    pub async fn has_active_lockout(
        &self,
        user_id: Uuid,
        origin: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut conn = self.acquire().await?;
        lockout_in_force(&mut conn, user_id, origin, now).await
    }

    /// Deactivate every attempt and lockout for the pair in one transaction.
    pub async fn unlock(&self, user_id: Uuid, origin: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("UPDATE failed_logins SET active = FALSE WHERE user_id = $1 AND origin = $2 AND active")
            .bind(user_id)
            .bind(origin)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear failed logins", e)
            })?;

        sqlx::query("UPDATE lockouts SET active = FALSE WHERE user_id = $1 AND origin = $2 AND active")
            .bind(user_id)
            .bind(origin)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear lockouts", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit unlock", e)
        })
    }

    /// Record a failure and lock the pair if the window count exceeds
    /// `threshold` and no lockout is already in force, as one transaction.
    ///
    /// A transaction-scoped advisory lock on the pair serialises concurrent
    /// failures so each one sees the counts of those before it.
    pub async fn record_failure_and_evaluate(
        &self,
        attempt: &FailedLogin,
        since: DateTime<Utc>,
        threshold: i64,
        candidate: Lockout,
    ) -> AppResult<FailureOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::TEXT || '|' || $2, 0))")
            .bind(attempt.user_id)
            .bind(&attempt.origin)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock login pair", e))?;

        insert_failure(&mut tx, attempt).await?;
        let recent_failures =
            count_failures_since(&mut tx, attempt.user_id, &attempt.origin, since).await?;

        let already_locked = lockout_in_force(
            &mut tx,
            attempt.user_id,
            &attempt.origin,
            attempt.attempted_at,
        )
        .await?;
        let lockout = if recent_failures > threshold && !already_locked {
            insert_lockout(&mut tx, &candidate).await?;
            Some(candidate)
        } else {
            None
        };

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit failed login", e)
        })?;

        Ok(FailureOutcome {
            recent_failures,
            lockout,
            already_locked,
        })
    }

    async fn acquire(&self) -> AppResult<sqlx::pool::PoolConnection<sqlx::Postgres>> {
        self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })
    }
}

async fn insert_failure(conn: &mut PgConnection, attempt: &FailedLogin) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO failed_logins (id, user_id, origin, attempted_at, active) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(attempt.id)
    .bind(attempt.user_id)
    .bind(&attempt.origin)
    .bind(attempt.attempted_at)
    .bind(attempt.active)
    .execute(conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record failed login", e))?;
    Ok(())
}

async fn count_failures_since(
    conn: &mut PgConnection,
    user_id: Uuid,
    origin: &str,
    since: DateTime<Utc>,
) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM failed_logins \
         WHERE user_id = $1 AND origin = $2 AND active AND attempted_at > $3",
    )
    .bind(user_id)
    .bind(origin)
    .bind(since)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count failed logins", e))
}

async fn lockout_in_force(
    conn: &mut PgConnection,
    user_id: Uuid,
    origin: &str,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM lockouts \
         WHERE user_id = $1 AND origin = $2 AND active AND locked_until > $3)",
    )
    .bind(user_id)
    .bind(origin)
    .bind(now)
    .fetch_one(conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check lockout", e))
}

async fn insert_lockout(conn: &mut PgConnection, lockout: &Lockout) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO lockouts (id, user_id, origin, locked_until, reason, active) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(lockout.id)
    .bind(lockout.user_id)
    .bind(&lockout.origin)
    .bind(lockout.locked_until)
    .bind(&lockout.reason)
    .bind(lockout.active)
    .execute(conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create lockout", e))?;
    Ok(())
}
