use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use super::app_state::AppState;
use super::{commands_api, events_api};

/// Events carry no file bytes (attachments travel by URL), so pushes
/// stay small.
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Build the axum router with the platform-facing routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/events", post(events_api::receive_event))
        .route("/api/commands", post(commands_api::execute_command))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
