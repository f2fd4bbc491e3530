/// Authentication middleware for protecting routes
///
/// Extracts and validates the bearer token from the Authorization header.
/// On success, adds the caller's identity to request extensions.
use super::jwt::{Claims, ROLE_ADMIN};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use journal_core::UserId;
use std::sync::Arc;

/// Identity of the authenticated caller, derived from a verified token
///
/// Added to request extensions by [`auth_middleware`]. Handlers take it as an
/// extractor; on a request without it the extractor answers 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub username: String,
    pub roles: Vec<String>,
}

impl CallerIdentity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.uid,
            username: claims.sub,
            roles: claims.roles,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(AppError::missing_token)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header
fn bearer_token(request: &Request<Body>) -> Result<&str, &'static str> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or("missing authorization header")?
        .to_str()
        .map_err(|_| "authorization header is not ASCII")?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("authorization scheme is not Bearer")
}

/// Authentication middleware that requires a valid token
///
/// This middleware:
/// 1. Extracts the Authorization header
/// 2. Validates the Bearer token format
/// 3. Verifies signature, issuer and expiry with the process-wide codec
/// 4. Adds `CallerIdentity` to request extensions
///
/// Every failure produces the same 401 body.
///
/// # Usage
///
/// ```ignore
/// let protected = Router::new()
///     .route("/journals", get(list_journals))
///     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = match bearer_token(&request) {
        Ok(token) => token,
        Err(reason) => {
            tracing::debug!(reason, "rejecting unauthenticated request");
            return Err(AppError::missing_token());
        }
    };

    let claims = match state.token_codec.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            audit_log(&AuditEvent::InvalidToken {
                ip_address: extract_ip_address(request.headers()),
                user_agent: extract_user_agent(request.headers()),
                reason: e.to_string(),
            });
            return Err(e.into());
        }
    };

    request
        .extensions_mut()
        .insert(CallerIdentity::from(claims));

    Ok(next.run(request).await)
}
