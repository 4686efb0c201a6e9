//! PostgreSQL user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use trailpass_core::error::{AppError, ErrorKind};
use trailpass_core::result::AppResult;
use trailpass_entity::user::{NewUser, PendingReset, User};

use crate::store::UserStore;

/// Name of the unique index on `LOWER(email)`.
const EMAIL_UNIQUE_INDEX: &str = "users_email_key";

/// Repository for user records backed by PostgreSQL.
///
/// Conditional writes are expressed as a single `UPDATE … WHERE …`, so the
/// row lock taken by the update is what serializes competing writers.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find user by id"))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find user by email"))
    }

    async fn create(&self, data: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.email)
        .bind(data.role)
        .bind(&data.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some(EMAIL_UNIQUE_INDEX) =>
            {
                AppError::conflict("An account with this email already exists")
            }
            other => AppError::with_source(ErrorKind::Database, "Failed to create user", other),
        })
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, password_changed_at = $3 \
             WHERE id = $1 AND active",
        )
        .bind(id)
        .bind(password_hash)
        .bind(changed_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update password"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn swap_password(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $3, password_changed_at = $4 \
             WHERE id = $1 AND password_hash = $2 AND active",
        )
        .bind(id)
        .bind(expected_hash)
        .bind(new_hash)
        .bind(changed_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to swap password"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_reset(&self, id: Uuid, reset: &PendingReset) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3 \
             WHERE id = $1 AND active",
        )
        .bind(id)
        .bind(&reset.token_hash)
        .bind(reset.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to store reset token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users \
             WHERE reset_token_hash = $1 AND reset_token_expires_at > $2 AND active",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find user by reset token"))
    }

    async fn clear_reset(&self, id: Uuid, token_hash: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET reset_token_hash = NULL, reset_token_expires_at = NULL \
             WHERE id = $1 AND reset_token_hash = $2",
        )
        .bind(id)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to clear reset token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn redeem_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET \
                 password_hash = $3, \
                 password_changed_at = $2, \
                 reset_token_hash = NULL, \
                 reset_token_expires_at = NULL \
             WHERE reset_token_hash = $1 AND reset_token_expires_at > $2 AND active \
             RETURNING *",
        )
        .bind(token_hash)
        .bind(now)
        .bind(new_password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to redeem reset token"))?;

        debug!(redeemed = user.is_some(), "Reset redemption attempted");
        Ok(user)
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET active = FALSE WHERE id = $1 AND active")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to deactivate user"))?;

        Ok(result.rows_affected() > 0)
    }
}
