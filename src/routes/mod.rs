use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub mod api;
pub mod ws;

/// All relay routes bound to `state`, without the server-level layers
/// (CORS, rate limiting, security headers) that `main` adds.
pub fn create_router(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(ws::create_ws_router())
        .with_state(state)
}
