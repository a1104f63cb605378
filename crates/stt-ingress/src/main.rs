//! Main entry point for the transcription ingress HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use stt_broker::{InMemoryBroker, RemoteTaskClient};
use stt_core::{context_error, context_error::Result, init_logging, Config as CoreConfig};
use stt_ingress::{build_router, AppState, IngressConfig};
use stt_orchestrator::OrchestratorConfig;
use stt_store::Store;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging()?;

    let core_config = CoreConfig::load().unwrap_or_else(|err| {
        info!("failed to load config ({err}), using defaults");
        CoreConfig::default()
    });
    let ingress_config = IngressConfig::load().unwrap_or_else(|err| {
        info!("failed to load ingress config ({err}), using defaults");
        IngressConfig::default()
    });

    info!(service = %core_config.service_name, "starting transcription ingress server");

    info!("connecting to result store...");
    let store = Arc::new(
        Store::connect(&core_config.mongo_uri())
            .await
            .map_err(|e| context_error!("result store connection failed: {}", e))?,
    );
    if let Err(e) = store.health_check().await {
        error!("result store health check failed: {e}");
        return Err(context_error!("result store health check failed: {}", e));
    }
    info!("result store connection established");

    let broker: Arc<dyn RemoteTaskClient> = Arc::new(InMemoryBroker::with_echo());
    let orchestrator_config = Arc::new(OrchestratorConfig::default());

    let state = Arc::new(
        AppState::new(
            core_config,
            store,
            broker,
            orchestrator_config,
            ingress_config.upload_dir.clone(),
            ingress_config.max_upload_bytes,
        )
        .map_err(|e| context_error!("failed to build application state: {}", e))?,
    );
    state.validate().map_err(|e| context_error!("application state validation failed: {}", e))?;

    info!("building application routes...");
    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr: SocketAddr = ingress_config
        .bind_address()
        .parse()
        .map_err(|e| context_error!("invalid server address: {}", e))?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| context_error!("failed to bind to {}: {}", addr, e))?;

    info!("server listening on http://{addr}");
    info!("healthcheck available at: http://{addr}/healthcheck");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| context_error!("server error: {}", e))?;

    info!("server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("received terminate signal, shutting down gracefully...");
        },
    }
}
