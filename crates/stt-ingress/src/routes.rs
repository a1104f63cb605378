//! API route definitions (§6): the six endpoints the ingress surface
//! exposes, with compression and a JSON 404 fallback.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;

use crate::{handlers, state::AppState};

/// Build the full set of routes the transcription ingress surface serves.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transcribe", post(handlers::upload::transcribe))
        .route("/transcribe-multi", post(handlers::upload::transcribe_multi))
        .route("/job/:id", get(handlers::status::get_job))
        .route("/revoke/:id", get(handlers::status::revoke_job))
        .route("/results/:id", get(handlers::results::get_result))
        .route("/healthcheck", get(handlers::health::healthcheck))
        .layer(CompressionLayer::new())
}

/// Combine all routes into a single router, with a JSON 404 fallback.
pub fn build_router() -> Router<Arc<AppState>> {
    Router::new().merge(api_routes()).fallback(not_found_handler)
}

async fn not_found_handler() -> (axum::http::StatusCode, axum::Json<serde_json::Value>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({
            "error": "Not Found",
            "message": "The requested endpoint does not exist"
        })),
    )
}
