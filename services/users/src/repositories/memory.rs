//! In-memory implementation of [`UserRepository`] for development and tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{RepositoryError, RepositoryResult, UserRepository};
use crate::{
    context::RequestContext,
    models::{PageRequest, User},
};

#[derive(Debug, Default)]
struct Store {
    users: HashMap<Uuid, User>,
    /// Last timestamp handed out; keeps creation order strict
    clock: Option<DateTime<Utc>>,
}

impl Store {
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.clock {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.clock = Some(now);
        now
    }

    fn active(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|u| u.is_active)
    }

    fn active_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.get_mut(&id).filter(|u| u.is_active)
    }

    /// Same uniqueness rules as the table constraints: across all rows,
    /// soft-deleted ones included
    fn check_unique(&self, user: &User) -> RepositoryResult<()> {
        for other in self.users.values().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(RepositoryError::Conflict(
                    "username is already taken".to_string(),
                ));
            }
            if other.email == user.email {
                return Err(RepositoryError::Conflict(
                    "email is already registered".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, ctx: &RequestContext, user: &mut User) -> RepositoryResult<()> {
        ctx.run(async {
            let mut store = self.store.write().await;

            let mut candidate = user.clone();
            candidate.id = Uuid::new_v4();
            store.check_unique(&candidate)?;

            let now = store.now();
            candidate.is_active = true;
            candidate.created_at = now;
            candidate.updated_at = now;

            store.users.insert(candidate.id, candidate.clone());
            *user = candidate;

            info!(user_id = %user.id, username = %user.username, "Created user");
            Ok::<_, RepositoryError>(())
        })
        .await?
    }

    async fn get_by_id(&self, ctx: &RequestContext, id: Uuid) -> RepositoryResult<User> {
        ctx.run(async {
            let store = self.store.read().await;
            store
                .active()
                .find(|u| u.id == id)
                .cloned()
                .ok_or(RepositoryError::NotFound)
        })
        .await?
    }

    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> RepositoryResult<User> {
        ctx.run(async {
            let store = self.store.read().await;
            store
                .active()
                .find(|u| u.email == email)
                .cloned()
                .ok_or(RepositoryError::NotFound)
        })
        .await?
    }

    async fn get_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> RepositoryResult<User> {
        ctx.run(async {
            let store = self.store.read().await;
            store
                .active()
                .find(|u| u.username == username)
                .cloned()
                .ok_or(RepositoryError::NotFound)
        })
        .await?
    }

    async fn list(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<User>> {
        let page = PageRequest::new(limit, offset);

        ctx.run(async {
            let store = self.store.read().await;

            let mut users: Vec<User> = store.active().cloned().collect();
            users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

            let window: Vec<User> = users
                .into_iter()
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .collect();
            Ok::<_, RepositoryError>(window)
        })
        .await?
    }

    async fn update(&self, ctx: &RequestContext, user: &mut User) -> RepositoryResult<()> {
        ctx.run(async {
            let mut store = self.store.write().await;

            if store.active_mut(user.id).is_none() {
                return Err(RepositoryError::NotFound);
            }
            store.check_unique(user)?;

            let now = store.now();
            let stored = store
                .active_mut(user.id)
                .ok_or(RepositoryError::NotFound)?;

            stored.username = user.username.clone();
            stored.email = user.email.clone();
            stored.first_name = user.first_name.clone();
            stored.last_name = user.last_name.clone();
            stored.is_active = user.is_active;
            stored.updated_at = now.max(stored.updated_at + Duration::microseconds(1));

            user.updated_at = stored.updated_at;

            info!(user_id = %user.id, "Updated user");
            Ok::<_, RepositoryError>(())
        })
        .await?
    }

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> RepositoryResult<()> {
        ctx.run(async {
            let mut store = self.store.write().await;

            let now = store.now();
            let stored = store.active_mut(id).ok_or(RepositoryError::NotFound)?;
            stored.is_active = false;
            stored.updated_at = now.max(stored.updated_at + Duration::microseconds(1));

            info!(user_id = %id, "Soft deleted user");
            Ok::<_, RepositoryError>(())
        })
        .await?
    }

    async fn count(&self, ctx: &RequestContext) -> RepositoryResult<i64> {
        ctx.run(async {
            let store = self.store.read().await;
            Ok::<_, RepositoryError>(store.active().count() as i64)
        })
        .await?
    }
}
