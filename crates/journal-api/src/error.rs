//! API error handling
//!
//! Every service returns `AppError`; the conversion to an HTTP response
//! happens once, here. Storage and cryptographic details are logged and
//! never echoed to the client.

use crate::auth::{jwt::TokenError, password::PasswordError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use journal_core::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    /// Login with an unknown username or a wrong password
    InvalidCredentials,
    /// Missing or invalid token, or a token whose user no longer exists
    Unauthorized(&'static str),
    Forbidden(String),
    NotFound(String),
    DuplicateUsername,
    Validation(BTreeMap<String, String>),
    BadRequest(String),
    Internal(String),
}

impl AppError {
    /// The uniform answer for any token problem
    pub fn missing_token() -> Self {
        AppError::Unauthorized("Invalid or missing token")
    }

    pub fn user_missing() -> Self {
        AppError::Unauthorized("User missing")
    }

    pub fn journal_not_found(id: i64) -> Self {
        AppError::NotFound(format!("Journal not found: {id}"))
    }

    pub fn user_not_found(id: i64) -> Self {
        AppError::NotFound(format!("User not found: {id}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateUsername => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::InvalidCredentials => ApiError::unauthorized("Bad credentials"),
            AppError::Unauthorized(msg) => ApiError::unauthorized(msg),
            AppError::Forbidden(msg) => ApiError::new("FORBIDDEN", msg),
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::DuplicateUsername => ApiError::new("CONFLICT", "username already exists"),
            AppError::Validation(fields) => {
                ApiError::new("VALIDATION_FAILED", "Validation failed").with_fields(fields)
            }
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                ApiError::internal_error()
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => AppError::DuplicateUsername,
            // The caller's account vanished between authentication and insert
            StoreError::UnknownOwner(_) => AppError::user_missing(),
            StoreError::Database(msg) => AppError::Internal(msg),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::EncodingError(_)
            | TokenError::SystemTimeError(_)
            | TokenError::ExpiryOverflow(_) => {
                AppError::Internal(err.to_string())
            }
            _ => AppError::missing_token(),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .collect();

        AppError::Validation(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_taxonomy() {
        let (status, json) = body_json(AppError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert_eq!(json["message"], "Bad credentials");

        let (status, json) = body_json(AppError::Forbidden("Not your journal".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "Not your journal");

        let (status, json) = body_json(AppError::DuplicateUsername).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "CONFLICT");

        let (status, _) = body_json(AppError::journal_not_found(9)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_echoed() {
        let (status, json) =
            body_json(AppError::Internal("connection refused at 10.0.0.5".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert!(!json.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_validation_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("username".to_string(), "too short".to_string());

        let (status, json) = body_json(AppError::Validation(fields)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert_eq!(json["fields"]["username"], "too short");
    }

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            AppError::from(StoreError::DuplicateUsername),
            AppError::DuplicateUsername
        );
        assert_eq!(
            AppError::from(StoreError::UnknownOwner(3)),
            AppError::user_missing()
        );
        assert!(matches!(
            AppError::from(StoreError::Database("boom".into())),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_token_errors_are_uniform() {
        assert_eq!(
            AppError::from(TokenError::ExpiredToken),
            AppError::missing_token()
        );
        assert_eq!(
            AppError::from(TokenError::InvalidSignature),
            AppError::missing_token()
        );
        assert_eq!(
            AppError::from(TokenError::InvalidToken),
            AppError::missing_token()
        );
    }
}
