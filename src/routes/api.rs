use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::api;
use crate::state::AppState;
use std::sync::Arc;

/// Largest accepted `recognize_once` upload (25 MB)
const MAX_UPLOAD_SIZE: usize = 25 * 1024 * 1024;

/// Create the HTTP API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/health", get(api::health_check))
        .route(
            "/stt/recognize_once",
            post(api::recognize_once).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
        )
        .layer(TraceLayer::new_for_http())
}
