pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route("/api/v1/sessions/:id", get(handlers::handle_get_session))
        // Wizard transitions
        .route("/api/v1/sessions/:id/begin", post(handlers::handle_begin))
        .route("/api/v1/sessions/:id/cv", post(handlers::handle_upload_cv))
        .route(
            "/api/v1/sessions/:id/profile",
            post(handlers::handle_submit_profile),
        )
        .route("/api/v1/sessions/:id/search", post(handlers::handle_search))
        .route("/api/v1/sessions/:id/draft", post(handlers::handle_draft))
        .route("/api/v1/sessions/:id/back", post(handlers::handle_back))
        .route("/api/v1/sessions/:id/home", post(handlers::handle_home))
        .route("/api/v1/sessions/:id/view", post(handlers::handle_view))
        .route(
            "/api/v1/sessions/:id/language",
            post(handlers::handle_language),
        )
        // Bulk generation and export
        .route("/api/v1/sessions/:id/bulk", post(handlers::handle_bulk))
        .route(
            "/api/v1/sessions/:id/export/:tier",
            get(handlers::handle_export),
        )
        .with_state(state)
}
