//! HTTP ingress and result-formatting surface for the transcription
//! orchestrator.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod format;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::IngressConfig;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;

/// Build the API router with all routes and middleware over `state`.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    routes::build_router()
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(middleware::cors::cors_layer())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use stt_broker::{InMemoryBroker, RemoteTaskClient};
    use stt_core::Config;
    use stt_orchestrator::OrchestratorConfig;
    use stt_store::Store;
    use tempfile::TempDir;

    #[tokio::test]
    async fn router_exposes_healthcheck() {
        let upload_dir = TempDir::new().unwrap();
        let store = Arc::new(Store::connect("mongodb://localhost:27017").await.unwrap());
        let broker: Arc<dyn RemoteTaskClient> = Arc::new(InMemoryBroker::with_echo());
        let state = Arc::new(
            AppState::new(
                Config::default(),
                store,
                broker,
                Arc::new(OrchestratorConfig::default()),
                upload_dir.path().to_path_buf(),
                500 * 1024 * 1024,
            )
            .unwrap(),
        );
        let app = build_router(state);

        use tower::ServiceExt;
        let request = axum::http::Request::builder()
            .uri("/healthcheck")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
