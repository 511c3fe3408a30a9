use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{health_check, method_not_allowed, track_click, TrackingState};

/// Request bodies are capped at 1 MB.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_tracking_router(state: Arc<TrackingState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/track/click",
            post(track_click).fallback(method_not_allowed),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
