//! PostgreSQL-backed user repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{RepositoryError, RepositoryResult, UserRepository};
use crate::{
    context::RequestContext,
    models::{PageRequest, User},
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, first_name, last_name, is_active, created_at, updated_at";

/// The soft-delete predicate shared by every statement
const ACTIVE: &str = "is_active = TRUE";

/// `updated_at` always moves forward, even within one transaction timestamp
const TOUCH_UPDATED_AT: &str = "updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')";

fn select_active(tail: &str) -> String {
    format!("SELECT {USER_COLUMNS} FROM users WHERE {ACTIVE} {tail}")
}

/// Unique violations become [`RepositoryError::Conflict`]
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some(c) if c.contains("username") => "username is already taken",
                Some(c) if c.contains("email") => "email is already registered",
                _ => "username or email is already in use",
            };
            return RepositoryError::Conflict(message.to_string());
        }
    }
    RepositoryError::Storage(err)
}

/// User repository over a PostgreSQL pool
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, ctx: &RequestContext, user: &mut User) -> RepositoryResult<()> {
        let (id, created_at, updated_at): (Uuid, DateTime<Utc>, DateTime<Utc>) = ctx
            .run(
                sqlx::query_as(
                    r#"
                    INSERT INTO users (username, email, password_hash, first_name, last_name, is_active)
                    VALUES ($1, $2, $3, $4, $5, TRUE)
                    RETURNING id, created_at, updated_at
                    "#,
                )
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .fetch_one(&self.pool),
            )
            .await?
            .map_err(map_write_error)?;

        user.id = id;
        user.is_active = true;
        user.created_at = created_at;
        user.updated_at = updated_at;

        info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(())
    }

    async fn get_by_id(&self, ctx: &RequestContext, id: Uuid) -> RepositoryResult<User> {
        debug!(user_id = %id, "Finding user by ID");

        let sql = select_active("AND id = $1");
        ctx.run(
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await??
        .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> RepositoryResult<User> {
        debug!(email = %email, "Finding user by email");

        let sql = select_active("AND email = $1");
        ctx.run(
            sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await??
        .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> RepositoryResult<User> {
        debug!(username = %username, "Finding user by username");

        let sql = select_active("AND username = $1");
        ctx.run(
            sqlx::query_as::<_, User>(&sql)
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await??
        .ok_or(RepositoryError::NotFound)
    }

    async fn list(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<User>> {
        let page = PageRequest::new(limit, offset);

        let sql = select_active("ORDER BY created_at DESC, id LIMIT $1 OFFSET $2");
        let users = ctx
            .run(
                sqlx::query_as::<_, User>(&sql)
                    .bind(page.limit)
                    .bind(page.offset)
                    .fetch_all(&self.pool),
            )
            .await??;

        Ok(users)
    }

    async fn update(&self, ctx: &RequestContext, user: &mut User) -> RepositoryResult<()> {
        let sql = format!(
            r#"
            UPDATE users
            SET username = $1, email = $2, first_name = $3, last_name = $4,
                is_active = $5, {TOUCH_UPDATED_AT}
            WHERE id = $6 AND {ACTIVE}
            RETURNING updated_at
            "#
        );

        let updated_at: DateTime<Utc> = ctx
            .run(
                sqlx::query_scalar(&sql)
                    .bind(&user.username)
                    .bind(&user.email)
                    .bind(&user.first_name)
                    .bind(&user.last_name)
                    .bind(user.is_active)
                    .bind(user.id)
                    .fetch_optional(&self.pool),
            )
            .await?
            .map_err(map_write_error)?
            .ok_or(RepositoryError::NotFound)?;

        user.updated_at = updated_at;

        info!(user_id = %user.id, "Updated user");
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> RepositoryResult<()> {
        let sql = format!("UPDATE users SET is_active = FALSE, {TOUCH_UPDATED_AT} WHERE id = $1 AND {ACTIVE}");

        let result = ctx
            .run(sqlx::query(&sql).bind(id).execute(&self.pool))
            .await??;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!(user_id = %id, "Soft deleted user");
        Ok(())
    }

    async fn count(&self, ctx: &RequestContext) -> RepositoryResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM users WHERE {ACTIVE}");

        let count: i64 = ctx
            .run(sqlx::query_scalar(&sql).fetch_one(&self.pool))
            .await??;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_active_always_filters_inactive_rows() {
        let sql = select_active("AND id = $1");
        assert!(sql.starts_with("SELECT id, username, email, password_hash"));
        assert!(sql.contains("WHERE is_active = TRUE AND id = $1"));
    }

    #[test]
    fn test_non_database_errors_are_storage_errors() {
        let err = map_write_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepositoryError::Storage(_)));
    }
}
