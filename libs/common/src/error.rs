//! Error types for the shared database infrastructure

use sqlx::{Error as SqlxError, migrate::MigrateError};
use thiserror::Error;

/// Failure while setting up or probing the connection pool
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not reach the server (connect or initial ping)
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// A probe query failed on an established pool
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Applying schema migrations failed
    #[error("Database migration error: {0}")]
    Migration(#[from] MigrateError),

    /// The configuration could not be turned into connect options
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
