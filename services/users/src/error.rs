//! HTTP error type for the users service
//!
//! Handlers are the only place where errors become status codes. Internal
//! failures are logged in full and answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::service::ServiceError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource absent or soft deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// Username or email already in use
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error; the message is safe to show to callers
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    /// Translate a service failure, logging the cause. `action` is the
    /// caller-facing message used for failures that must stay opaque.
    pub fn from_service(err: ServiceError, action: &str) -> Self {
        match err {
            ServiceError::NotFound => ApiError::NotFound("User not found".to_string()),
            ServiceError::Conflict(message) => ApiError::Conflict(message),
            other => {
                error!(error = %other, "{}", action);
                ApiError::InternalServerError(action.to_string())
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg) => msg,
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::RepositoryError;

    #[test]
    fn test_not_found_and_conflict_keep_their_kind() {
        let err = ApiError::from_service(ServiceError::NotFound, "Failed to get user");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from_service(
            ServiceError::Conflict("email is already registered".to_string()),
            "Failed to create user",
        );
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_errors_are_opaque() {
        let err = ApiError::from_service(
            ServiceError::Storage {
                context: "failed to create user",
                source: RepositoryError::Storage(sqlx::Error::PoolTimedOut),
            },
            "Failed to create user",
        );

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        match err {
            ApiError::InternalServerError(msg) => {
                assert_eq!(msg, "Failed to create user");
                assert!(!msg.contains("pool"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
