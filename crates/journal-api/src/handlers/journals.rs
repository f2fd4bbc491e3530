//! Journal handlers
//!
//! The caller id always comes from the verified token, never from the body
//! or the path.

use crate::auth::middleware::CallerIdentity;
use crate::error::AppError;
use crate::extract::{ApiPath, ValidatedJson};
use crate::journals::{JournalPatchRequest, JournalRequest, PageQuery};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use journal_core::JournalId;
use std::sync::Arc;

/// Create a journal owned by the caller
#[utoipa::path(
    post,
    path = "/api/journals",
    tag = "journals",
    request_body = JournalRequest,
    responses(
        (status = 201, description = "Journal created", body = crate::journals::JournalResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_journal(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ValidatedJson(request): ValidatedJson<JournalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let journal = state.journals.create(caller.user_id, request).await?;

    Ok((StatusCode::CREATED, Json(journal)))
}

/// List the caller's journals, newest first
#[utoipa::path(
    get,
    path = "/api/journals",
    tag = "journals",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of journals", body = crate::journals::JournalPage),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_journals(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.journals.list(caller.user_id, query.into()).await?;

    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/journals/{id}",
    tag = "journals",
    params(("id" = i64, Path, description = "Journal id")),
    responses(
        (status = 200, description = "Journal", body = crate::journals::JournalResponse),
        (status = 403, description = "Not your journal", body = crate::error::ApiError),
        (status = 404, description = "Journal not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_journal(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ApiPath(id): ApiPath<JournalId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.journals.get(caller.user_id, id).await?))
}

/// Replace title and message
#[utoipa::path(
    put,
    path = "/api/journals/{id}",
    tag = "journals",
    params(("id" = i64, Path, description = "Journal id")),
    request_body = JournalRequest,
    responses(
        (status = 200, description = "Journal updated", body = crate::journals::JournalResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 403, description = "Not your journal", body = crate::error::ApiError),
        (status = 404, description = "Journal not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_journal(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ApiPath(id): ApiPath<JournalId>,
    ValidatedJson(request): ValidatedJson<JournalRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.journals.update(caller.user_id, id, request).await?))
}

/// Update only the provided, non-blank fields
#[utoipa::path(
    patch,
    path = "/api/journals/{id}",
    tag = "journals",
    params(("id" = i64, Path, description = "Journal id")),
    request_body = JournalPatchRequest,
    responses(
        (status = 200, description = "Journal updated", body = crate::journals::JournalResponse),
        (status = 403, description = "Not your journal", body = crate::error::ApiError),
        (status = 404, description = "Journal not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn patch_journal(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ApiPath(id): ApiPath<JournalId>,
    ValidatedJson(request): ValidatedJson<JournalPatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.journals.patch(caller.user_id, id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/journals/{id}",
    tag = "journals",
    params(("id" = i64, Path, description = "Journal id")),
    responses(
        (status = 204, description = "Journal deleted"),
        (status = 403, description = "Not your journal", body = crate::error::ApiError),
        (status = 404, description = "Journal not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_journal(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    ApiPath(id): ApiPath<JournalId>,
) -> Result<impl IntoResponse, AppError> {
    state.journals.delete(caller.user_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
