//! Request logging middleware for tracing and monitoring

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Request logging middleware that tracks request timing and details.
pub async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let request_id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|h| h.to_str().ok())
        .map(String::from)
        .unwrap_or_else(generate_request_id);

    request.extensions_mut().insert(start_time);

    let span = tracing::info_span!(
        "request",
        method = %method,
        uri = %uri,
        version = ?version,
        request_id = %request_id,
    );

    async move {
        info!("starting request processing");

        let response = next.run(request).await;
        let elapsed = start_time.elapsed();
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            warn!(status = %status, elapsed = ?elapsed, "request completed with error");
        } else {
            info!(status = %status, elapsed = ?elapsed, "request completed successfully");
        }

        response
    }
    .instrument(span)
    .await
}

/// Generate a unique request id for tracing.
fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Request timing middleware that adds an `X-Response-Time` header.
pub async fn timing_middleware(mut request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    request.extensions_mut().insert(start_time);

    let mut response = next.run(request).await;
    let elapsed = start_time.elapsed();
    response
        .headers_mut()
        .insert("X-Response-Time", HeaderValue::from(elapsed.as_millis() as u64));
    response
}
