//! Repositories for database operations
//!
//! [`UserRepository`] is the persistence boundary of the service. It owns
//! storage access and nothing else: no hashing, no partial-update merging.
//! Soft-deleted rows (`is_active = false`) are invisible to every read.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{context::Canceled, context::RequestContext, models::User};

pub mod memory;
pub mod user;

pub use memory::InMemoryUserRepository;
pub use user::PgUserRepository;

/// Failure of a single storage operation
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No active row matches
    #[error("user not found")]
    NotFound,

    /// A uniqueness constraint (username or email) rejected the write
    #[error("user already exists: {0}")]
    Conflict(String),

    /// The request context expired while the call was in flight
    #[error(transparent)]
    Canceled(#[from] Canceled),

    /// Connectivity or query failure
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistence operations for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert `user` as active and write the storage-assigned id and
    /// timestamps back into it
    async fn create(&self, ctx: &RequestContext, user: &mut User) -> RepositoryResult<()>;

    /// Get an active user by ID
    async fn get_by_id(&self, ctx: &RequestContext, id: Uuid) -> RepositoryResult<User>;

    /// Get an active user by email
    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> RepositoryResult<User>;

    /// Get an active user by username
    async fn get_by_username(&self, ctx: &RequestContext, username: &str)
    -> RepositoryResult<User>;

    /// Active users, newest first. Raw values are normalized with
    /// [`crate::models::PageRequest::new`].
    async fn list(&self, ctx: &RequestContext, limit: i64, offset: i64)
    -> RepositoryResult<Vec<User>>;

    /// Overwrite the mutable fields of an active user and refresh
    /// `updated_at` in place
    async fn update(&self, ctx: &RequestContext, user: &mut User) -> RepositoryResult<()>;

    /// Soft delete an active user
    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> RepositoryResult<()>;

    /// Number of active users
    async fn count(&self, ctx: &RequestContext) -> RepositoryResult<i64>;
}
