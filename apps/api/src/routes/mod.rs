pub mod handlers;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/career-paths",
            post(handlers::handle_generate_career_paths),
        )
        .route(
            "/api/v1/career-paths/explore",
            post(handlers::handle_explore_career_path),
        )
        .route("/api/v1/resume/parse", post(handlers::handle_parse_resume))
        .with_state(state)
}
