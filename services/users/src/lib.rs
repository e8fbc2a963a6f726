//! Users service
//!
//! CRUD over user accounts behind a JSON HTTP API. Requests flow through
//! three layers: [`routes`] decodes and validates, [`service`] hashes
//! passwords and merges updates, [`repositories`] talks to storage.
//! Deletion is soft: a deleted user keeps its row with `is_active = false`
//! and disappears from every read.
//!
//! ```no_run
//! use users::{AppState, config::ServerConfig, repositories::InMemoryUserRepository};
//! use users::{routes::create_router, service::UserServiceImpl};
//!
//! let state = AppState::new(UserServiceImpl::new(InMemoryUserRepository::new()));
//! let app = create_router(state, &ServerConfig::default());
//! # drop(app);
//! ```

pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod state;
pub mod validation;

pub use context::RequestContext;
pub use error::{ApiError, ApiResult};
pub use service::{ServiceError, UserService, UserServiceImpl};
pub use state::AppState;
