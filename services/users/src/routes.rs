//! Users service routes

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::ServerConfig,
    context::RequestContext,
    error::{ApiError, ApiResult},
    middleware,
    models::{
        CreateUserRequest, ListUsersQuery, ListUsersResponse, LookupQuery, Pagination,
        UpdateUserRequest,
    },
    state::AppState,
};

/// Build the complete application: routes, state and middleware
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/lookup", get(lookup_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        );

    let router = Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .with_state(state);

    middleware::apply(router, server)
}

pub async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "pong" }))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "users-service"
    }))
}

fn user_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id).map_err(|rejection| {
        debug!(error = %rejection, "Rejected user id");
        ApiError::BadRequest("Invalid user ID".to_string())
    })
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(payload)| payload).map_err(|rejection| {
        debug!(error = %rejection, "Rejected request body");
        ApiError::BadRequest("Invalid request body".to_string())
    })
}

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = json_body(body)?;
    payload.validate().map_err(ApiError::BadRequest)?;

    let user = state
        .user_service
        .create_user(&ctx, payload)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to create user"))?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = user_id(path)?;

    let user = state
        .user_service
        .get_user_by_id(&ctx, id)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to get user"))?;

    Ok(Json(user))
}

/// List active users, newest first
///
/// A failing count does not fail the listing; `total` is reported as 0.
pub async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let page = query.map(|Query(q)| q).unwrap_or_default().page();

    let users = state
        .user_service
        .list_users(&ctx, page.limit, page.offset)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to list users"))?;

    let total = match state.user_service.get_users_count(&ctx).await {
        Ok(total) => total,
        Err(e) => {
            warn!(error = %e, "Failed to count users");
            0
        }
    };

    Ok(Json(ListUsersResponse {
        data: users,
        pagination: Pagination {
            limit: page.limit,
            offset: page.offset,
            total,
        },
    }))
}

/// Find a user by exactly one of `email` or `username`
pub async fn lookup_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let result = match (non_empty(query.email), non_empty(query.username)) {
        (Some(email), None) => state.user_service.get_user_by_email(&ctx, &email).await,
        (None, Some(username)) => {
            state
                .user_service
                .get_user_by_username(&ctx, &username)
                .await
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Exactly one of email or username is required".to_string(),
            ));
        }
    };

    let user = result.map_err(|e| ApiError::from_service(e, "Failed to get user"))?;
    Ok(Json(user))
}

/// Apply a partial update
pub async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = user_id(path)?;
    let payload = json_body(body)?;
    payload.validate().map_err(ApiError::BadRequest)?;

    let user = state
        .user_service
        .update_user(&ctx, id, payload)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to update user"))?;

    Ok(Json(user))
}

/// Soft delete a user
pub async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = user_id(path)?;

    state
        .user_service
        .delete_user(&ctx, id)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to delete user"))?;

    Ok(StatusCode::NO_CONTENT)
}
