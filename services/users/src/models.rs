//! API models for request and response payloads

use serde::{Deserialize, Serialize};

pub mod user;

pub use user::{CreateUserRequest, UpdateUserRequest, User, UserResponse};

/// Page size used when the caller gives none or a non-positive one
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a single list call returns
pub const MAX_LIMIT: i64 = 100;

/// Normalized pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    /// Clamp raw values: `limit <= 0` becomes [`DEFAULT_LIMIT`], `limit` is
    /// capped at [`MAX_LIMIT`], a negative `offset` becomes 0.
    pub fn new(limit: i64, offset: i64) -> Self {
        let limit = if limit <= 0 {
            DEFAULT_LIMIT
        } else {
            limit.min(MAX_LIMIT)
        };

        Self {
            limit,
            offset: offset.max(0),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, 0)
    }
}

/// Query parameters for user listing
///
/// Kept as raw strings so a malformed number falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListUsersQuery {
    pub fn page(&self) -> PageRequest {
        let parse = |raw: &Option<String>, default: i64| {
            raw.as_deref()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(default)
        };

        PageRequest::new(parse(&self.limit, DEFAULT_LIMIT), parse(&self.offset, 0))
    }
}

/// Pagination metadata returned alongside a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
}

/// Response for user listing with pagination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}

/// Query parameters for looking a user up by a unique attribute
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupQuery {
    pub email: Option<String>,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { limit: 10, offset: 0 });
        assert_eq!(PageRequest::new(-5, -1), PageRequest { limit: 10, offset: 0 });
        assert_eq!(PageRequest::new(25, 40), PageRequest { limit: 25, offset: 40 });
    }

    #[test]
    fn test_page_request_caps_limit() {
        assert_eq!(PageRequest::new(10_000, 0).limit, MAX_LIMIT);
    }

    #[test]
    fn test_list_query_falls_back_on_garbage() {
        let query = ListUsersQuery {
            limit: Some("abc".to_string()),
            offset: Some("-3x".to_string()),
        };
        assert_eq!(query.page(), PageRequest::default());

        let query = ListUsersQuery {
            limit: Some("2".to_string()),
            offset: Some("4".to_string()),
        };
        assert_eq!(query.page(), PageRequest { limit: 2, offset: 4 });
    }
}
