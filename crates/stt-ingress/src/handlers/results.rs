//! `GET /results/{id}` (component H): fetch a persisted result and render it
//! in the format the `Accept` header negotiates to.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::warn;
use uuid::Uuid;

use crate::format::{render, ResultFormat};
use crate::state::AppState;

pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(result_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json");

    let Some(format) = ResultFormat::from_accept_header(accept) else {
        return (StatusCode::BAD_REQUEST, format!("unsupported Accept header: {accept}"))
            .into_response();
    };

    match state.store.fetch_result(result_id).await {
        Ok(Some(result)) => {
            let document = result.to_document();
            ([(header::CONTENT_TYPE, format.content_type())], render(&document, format)).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "unknown result id").into_response(),
        Err(e) => {
            warn!(%result_id, error = %e, "result lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
