//! Request-scoped execution context
//!
//! Every repository and service call receives a [`RequestContext`]. When the
//! context carries a deadline, [`RequestContext::run`] drops the in-flight
//! future once the deadline passes. Dropping a sqlx future aborts the query
//! and returns its connection to the pool.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::{convert::Infallible, future::Future, net::IpAddr, time::Duration};
use thiserror::Error;
use tokio::time::Instant;

/// The context's deadline passed before the operation finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation canceled: request deadline exceeded")]
pub struct Canceled;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request_id: Option<String>,
    client_ip: Option<IpAddr>,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that never expires
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_client_ip(mut self, client_ip: IpAddr) -> Self {
        self.client_ip = Some(client_ip);
        self
    }

    /// Tighten the deadline to `now + timeout`; an earlier deadline is kept
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Drive `fut` to completion unless the deadline passes first
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Canceled>
    where
        F: Future,
    {
        match self.deadline {
            Some(_) if self.is_expired() => Err(Canceled),
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| Canceled),
            None => Ok(fut.await),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}
