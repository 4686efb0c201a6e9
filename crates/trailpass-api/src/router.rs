//! Route definitions for the Trailpass HTTP API.
//!
//! Account and session routes are mounted under `/api/v1/users`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/users", user_routes())
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::error_detail::render_error_detail,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Signup, login, logout, password reset and change, identity.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/logout", get(handlers::auth::logout))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password/{token}", patch(handlers::auth::reset_password))
        .route("/update-my-password", patch(handlers::auth::update_my_password))
        .route("/me", get(handlers::auth::me))
        .route("/session", get(handlers::auth::session))
        .route("/delete-me", delete(handlers::auth::delete_me))
        .route("/{id}", delete(handlers::auth::deactivate_user))
}
