//! API route definitions

use crate::auth::middleware::auth_middleware;
use crate::handlers::{auth, journals, users};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Routes mounted under `/api`
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/users", post(auth::signup_handler));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(users::me_handler)
                .put(users::update_me_handler)
                .delete(users::delete_me_handler),
        )
        .route(
            "/users/:id",
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(
            "/journals",
            post(journals::create_journal).get(journals::list_journals),
        )
        .route(
            "/journals/:id",
            get(journals::get_journal)
                .put(journals::update_journal)
                .patch(journals::patch_journal)
                .delete(journals::delete_journal),
        )
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
