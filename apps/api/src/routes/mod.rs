pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyses", post(handlers::handle_analyze))
        .route("/api/v1/keywords", post(handlers::handle_extract_keywords))
        .route("/api/v1/bias", post(handlers::handle_detect_bias))
        .route("/api/v1/match", post(handlers::handle_match))
        .route("/api/v1/stats", get(handlers::handle_stats))
        .route("/api/v1/matches", get(handlers::handle_recent_matches))
        .route("/api/v1/jds/:id", get(handlers::handle_get_jd))
        .route("/api/v1/cvs/:id", get(handlers::handle_get_cv))
        .with_state(state)
}
