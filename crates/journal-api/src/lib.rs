//! Journal API - REST server
//!
//! Multi-tenant journal backend: stateless bearer-token authentication and
//! per-user ownership of journals.

pub mod audit;
pub mod auth;
pub mod doc;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod journals;
pub mod middleware;
pub mod routes;
pub mod state;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use handlers::health::{health_check, readiness_check};
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", routes::api_routes(state.clone()))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(doc::ApiDoc::openapi())
}

/// CORS restricted to the configured origins; no origin is allowed when the list is empty
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Signing secret used by the in-memory test router
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_JWT_SECRET: &str = "test-secret-key-that-is-32-bytes!";

/// Configuration for tests: fixed secret, cheap password hashing
#[cfg(any(test, feature = "test-utils"))]
pub fn test_config(policy: journal_core::OwnershipPolicy) -> journal_core::AppConfig {
    let mut config = journal_core::AppConfig::default();
    config.auth.jwt_secret = Some(TEST_JWT_SECRET.to_string());
    config.auth.ownership_policy = policy;
    config.auth.password = journal_core::config::PasswordCost {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    };
    config
}

/// Application state over a fresh in-memory store
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(policy: journal_core::OwnershipPolicy) -> Arc<AppState> {
    let store = Arc::new(journal_core::MemoryStore::new());
    let state = AppState::new(test_config(policy), store.clone(), store)
        .expect("test configuration is valid");
    Arc::new(state)
}

/// Router over a fresh in-memory store with the default ownership policy
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_router(create_test_state(journal_core::OwnershipPolicy::default()))
}
