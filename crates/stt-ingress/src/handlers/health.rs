//! `GET /healthcheck`: a cheap liveness probe (§6). Does not round-trip to
//! the result store; process liveness is the only thing this contract asks
//! for.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

pub async fn healthcheck() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}
