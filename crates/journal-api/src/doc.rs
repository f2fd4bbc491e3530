//! OpenAPI documentation
//!
//! Served as JSON at `/api-docs/openapi.json`.

use crate::auth::models::{LoginRequest, TokenResponse, UserRequest, UserResponse};
use crate::error::ApiError;
use crate::handlers::health::{HealthResponse, ReadinessResponse};
use crate::journals::{JournalPage, JournalPatchRequest, JournalRequest, JournalResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the bearer token scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Journal API",
        description = "Multi-tenant journal backend with bearer-token authentication."
    ),
    paths(
        crate::handlers::health::health_check,
        crate::handlers::health::readiness_check,
        crate::handlers::auth::login_handler,
        crate::handlers::auth::signup_handler,
        crate::handlers::users::me_handler,
        crate::handlers::users::update_me_handler,
        crate::handlers::users::delete_me_handler,
        crate::handlers::users::get_user_handler,
        crate::handlers::users::update_user_handler,
        crate::handlers::users::delete_user_handler,
        crate::handlers::journals::create_journal,
        crate::handlers::journals::list_journals,
        crate::handlers::journals::get_journal,
        crate::handlers::journals::update_journal,
        crate::handlers::journals::patch_journal,
        crate::handlers::journals::delete_journal,
    ),
    components(schemas(
        ApiError,
        LoginRequest,
        TokenResponse,
        UserRequest,
        UserResponse,
        JournalRequest,
        JournalPatchRequest,
        JournalResponse,
        JournalPage,
        HealthResponse,
        ReadinessResponse,
    )),
    tags(
        (name = "auth", description = "Login"),
        (name = "users", description = "Signup and account management"),
        (name = "journals", description = "Journals owned by the caller"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_protected_paths() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/journals/{id}"));
        assert!(doc.paths.paths.contains_key("/api/users/me"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
