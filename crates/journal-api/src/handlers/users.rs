//! Account handlers
//!
//! `/api/users/me` acts on the token's own account. `/api/users/:id` is open
//! to the account owner and to administrators only.

use crate::auth::{middleware::CallerIdentity, models::UserRequest};
use crate::error::AppError;
use crate::extract::{ApiPath, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use journal_core::UserId;
use std::sync::Arc;

/// Current account
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user profile", body = crate::auth::models::UserResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.me(&caller).await?))
}

/// Replace name, username and password of the current account
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 200, description = "Account updated", body = crate::auth::models::UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 409, description = "Username already exists", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.update_me(&caller, request).await?))
}

/// Delete the current account and its journals
#[utoipa::path(
    delete,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_me_handler(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<impl IntoResponse, AppError> {
    state.users.delete_me(&caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = crate::auth::models::UserResponse),
        (status = 403, description = "Not the caller's account", body = crate::error::ApiError),
        (status = 404, description = "No such user", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ApiPath(id): ApiPath<UserId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.get_user(id, &caller).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "Account updated", body = crate::auth::models::UserResponse),
        (status = 403, description = "Not the caller's account", body = crate::error::ApiError),
        (status = 404, description = "No such user", body = crate::error::ApiError),
        (status = 409, description = "Username already exists", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ApiPath(id): ApiPath<UserId>,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.update_user(id, &caller, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Not the caller's account", body = crate::error::ApiError),
        (status = 404, description = "No such user", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ApiPath(id): ApiPath<UserId>,
) -> Result<impl IntoResponse, AppError> {
    state.users.delete_user(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
