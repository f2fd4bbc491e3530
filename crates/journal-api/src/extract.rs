//! Request extraction with structured rejections

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has been deserialized and validated
///
/// Malformed JSON answers `400 BAD_REQUEST`; a well-formed body that breaks
/// a field rule answers `400 VALIDATION_FAILED` with per-field messages.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;

        value.validate()?;

        Ok(Self(value))
    }
}

/// Path parameters whose parse failure answers `400 BAD_REQUEST` in the API error format
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| AppError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}
