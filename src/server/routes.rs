//! Router configuration for the verification server.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::app_page))
        // Conversion lifecycle
        .route("/api/convert", post(handlers::start_conversion))
        .route("/api/result", get(handlers::current_result))
        .route("/api/reset", post(handlers::reset_attempt))
        // Verification artefacts
        .route("/api/map", get(handlers::map_plan))
        .route("/api/download", get(handlers::download_document))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
