//! Service layer for user business logic
//!
//! Orchestrates repository calls, hashes passwords, merges partial updates
//! and maps entities to their response projection. `NotFound` and
//! `Conflict` pass through unchanged; other repository failures are wrapped
//! with the operation that failed.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    context::RequestContext,
    models::{CreateUserRequest, UpdateUserRequest, User, UserResponse},
    password::{self, PasswordError},
    repositories::{RepositoryError, UserRepository},
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("user not found")]
    NotFound,

    #[error("user already exists: {0}")]
    Conflict(String),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error("{context}: operation canceled")]
    Canceled { context: &'static str },

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Attach the failing operation to a repository error
trait Context<T> {
    fn context(self, context: &'static str) -> ServiceResult<T>;
}

impl<T> Context<T> for Result<T, RepositoryError> {
    fn context(self, context: &'static str) -> ServiceResult<T> {
        self.map_err(|err| match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::Conflict(message) => ServiceError::Conflict(message),
            RepositoryError::Canceled(_) => ServiceError::Canceled { context },
            source @ RepositoryError::Storage(_) => ServiceError::Storage { context, source },
        })
    }
}

/// User operations exposed to the HTTP layer
#[async_trait]
pub trait UserService: Send + Sync {
    async fn create_user(
        &self,
        ctx: &RequestContext,
        req: CreateUserRequest,
    ) -> ServiceResult<UserResponse>;

    async fn get_user_by_id(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<UserResponse>;

    async fn get_user_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> ServiceResult<UserResponse>;

    async fn get_user_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> ServiceResult<UserResponse>;

    async fn list_users(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<UserResponse>>;

    /// Read-modify-write of the fields present in `req`. Two overlapping
    /// updates of the same id are not serialized: the last write wins.
    async fn update_user(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> ServiceResult<UserResponse>;

    async fn delete_user(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<()>;

    async fn get_users_count(&self, ctx: &RequestContext) -> ServiceResult<i64>;
}

/// Default [`UserService`] over any repository
pub struct UserServiceImpl<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for UserServiceImpl<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> UserServiceImpl<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: UserRepository + 'static> UserService for UserServiceImpl<R> {
    #[instrument(skip_all, fields(username = %req.username))]
    async fn create_user(
        &self,
        ctx: &RequestContext,
        req: CreateUserRequest,
    ) -> ServiceResult<UserResponse> {
        let password_hash = ctx
            .run(password::hash_password_blocking(req.password))
            .await
            .map_err(|_| ServiceError::Canceled {
                context: "failed to hash password",
            })??;

        let mut user = User::new(
            req.username,
            req.email,
            password_hash,
            req.first_name,
            req.last_name,
        );

        self.repository
            .create(ctx, &mut user)
            .await
            .context("failed to create user")?;

        info!(user_id = %user.id, "User created");
        Ok(user.into())
    }

    async fn get_user_by_id(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<UserResponse> {
        let user = self
            .repository
            .get_by_id(ctx, id)
            .await
            .context("failed to get user")?;

        Ok(user.into())
    }

    async fn get_user_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> ServiceResult<UserResponse> {
        let user = self
            .repository
            .get_by_email(ctx, email)
            .await
            .context("failed to get user")?;

        Ok(user.into())
    }

    async fn get_user_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> ServiceResult<UserResponse> {
        let user = self
            .repository
            .get_by_username(ctx, username)
            .await
            .context("failed to get user")?;

        Ok(user.into())
    }

    async fn list_users(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<UserResponse>> {
        let users = self
            .repository
            .list(ctx, limit, offset)
            .await
            .context("failed to list users")?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self, ctx, req))]
    async fn update_user(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> ServiceResult<UserResponse> {
        let mut user = self
            .repository
            .get_by_id(ctx, id)
            .await
            .context("failed to get user")?;

        user.apply_update(req);

        self.repository
            .update(ctx, &mut user)
            .await
            .context("failed to update user")?;

        Ok(user.into())
    }

    async fn delete_user(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<()> {
        self.repository
            .delete(ctx, id)
            .await
            .context("failed to delete user")?;

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn get_users_count(&self, ctx: &RequestContext) -> ServiceResult<i64> {
        self.repository
            .count(ctx)
            .await
            .context("failed to count users")
    }
}
