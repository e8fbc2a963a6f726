//! Application state shared across handlers

use std::sync::Arc;

use crate::service::UserService;

/// Application state shared across handlers
///
/// Holds no per-request data; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
}

impl AppState {
    pub fn new(user_service: impl UserService + 'static) -> Self {
        Self {
            user_service: Arc::new(user_service),
        }
    }
}
