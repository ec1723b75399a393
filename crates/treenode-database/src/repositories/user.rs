//! User repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use treenode_core::error::{AppError, ErrorKind};
use treenode_core::result::AppResult;
use treenode_entity::user::User;

/// Repository for user lookups and the credential-related updates.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    /// Find the user holding an email confirmation token hash.
    pub async fn find_by_confirm_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email_confirm_token = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    "Failed to find user by confirmation token",
                    e,
                )
            })
    }

    /// Find the user holding a password reset token hash.
    pub async fn find_by_reset_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE password_reset_token = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by reset token", e)
            })
    }

    /// Overwrite the outstanding email confirmation token.
    pub async fn set_confirm_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET email_confirm_token = $2, email_confirm_issued_at = $3 WHERE id = $1",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(issued_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to store confirmation token", e)
        })?;
        Ok(())
    }

    /// Overwrite the outstanding password reset token.
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET password_reset_token = $2, password_reset_issued_at = $3 WHERE id = $1",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(issued_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store reset token", e))?;
        Ok(())
    }

    /// Confirm the email if `token_hash` is still the outstanding token.
    ///
    /// Returns `false` when another redemption got there first.
    pub async fn mark_confirmed(&self, user_id: Uuid, token_hash: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET email_confirmed = TRUE, email_confirm_token = NULL, \
             email_confirm_issued_at = NULL \
             WHERE id = $1 AND email_confirm_token = $2 AND NOT email_confirmed",
        )
        .bind(user_id)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to confirm email", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Write a new password hash, clear the reset token and move the epoch.
    ///
    /// With `expected_reset_hash` set, the update only applies while that
    /// reset token is still outstanding. Returns whether a row changed.
    pub async fn replace_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        expected_reset_hash: Option<&str>,
        new_epoch: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, password_reset_token = NULL, \
             password_reset_issued_at = NULL, session_epoch = $3 \
             WHERE id = $1 AND ($4::TEXT IS NULL OR password_reset_token = $4)",
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(new_epoch)
        .bind(expected_reset_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Assign a fresh random session epoch and return it.
    pub async fn bump_epoch(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE users SET session_epoch = $2 WHERE id = $1 RETURNING session_epoch",
        )
        .bind(user_id)
        .bind(Uuid::new_v4())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to change session epoch", e))
    }
}
