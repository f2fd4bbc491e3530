//! Login and signup handlers
//!
//! Both endpoints are public; everything else sits behind the auth middleware.

use crate::auth::models::{LoginRequest, UserRequest};
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// Login with username and password
///
/// Authenticates a user and returns a bearer token valid for one hour.
///
/// # Responses
///
/// * `200 OK` - Authentication successful
/// * `401 Unauthorized` - Unknown username or wrong password (same body)
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::auth::models::TokenResponse),
        (status = 400, description = "Malformed body", body = crate::error::ApiError),
        (status = 401, description = "Bad credentials", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth.login(request).await?;

    Ok(Json(response))
}

/// Register a new account
///
/// # Request Body
///
/// * `name` - Optional display name, at most 255 characters
/// * `username` - Letters only, 5 to 50 of them, unique ignoring case
/// * `password` - At least 8 ASCII letters, digits or punctuation
///
/// # Responses
///
/// * `201 Created` - Account created
/// * `400 Bad Request` - Field rules violated
/// * `409 Conflict` - Username already taken
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User registered successfully", body = crate::auth::models::UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "Username already exists", body = crate::error::ApiError),
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.create_user(request).await?;

    Ok((StatusCode::CREATED, Json(user)))
}
