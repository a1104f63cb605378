//! Job state polling and revocation (§4.G.4, §5's Sent/Pending disambiguation, S8).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use stt_core::types::JobState;

use crate::state::AppState;

/// `GET /job/{id}` response body.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Poll a job's state.
///
/// Translates the orchestrator's raw [`JobState`] taxonomy into the
/// user-facing one, masking the Sent/Pending ambiguity described in §5: an
/// id with no record at all (`raw=Pending`) is reported as `404 unknown
/// jobid`, while a record in `Sent` or `Started` is reported as `202
/// pending`/`started` respectively.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> (StatusCode, Json<JobStatusResponse>) {
    let Some(record) = state.orchestrator.job(job_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(JobStatusResponse {
                state: "failed",
                steps: None,
                result_id: None,
                reason: Some("Unknown jobid".to_string()),
            }),
        );
    };

    match record.state {
        JobState::Sent => (
            StatusCode::ACCEPTED,
            Json(JobStatusResponse {
                state: "pending",
                steps: Some(json!(record.steps)),
                result_id: None,
                reason: None,
            }),
        ),
        JobState::Started | JobState::Pending => (
            StatusCode::ACCEPTED,
            Json(JobStatusResponse {
                state: "started",
                steps: Some(json!(record.steps)),
                result_id: None,
                reason: None,
            }),
        ),
        JobState::Success => (
            StatusCode::CREATED,
            Json(JobStatusResponse {
                state: "done",
                steps: None,
                result_id: record.result_id,
                reason: None,
            }),
        ),
        JobState::Failure => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(JobStatusResponse {
                state: "failed",
                steps: None,
                result_id: None,
                reason: record.error.clone(),
            }),
        ),
    }
}

/// `GET /revoke/{id}`: cancel a running job.
pub async fn revoke_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> StatusCode {
    info!(%job_id, "revoking job");
    state.orchestrator.revoke(job_id);
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_response_omits_null_fields() {
        let response = JobStatusResponse {
            state: "done",
            steps: None,
            result_id: Some(Uuid::nil()),
            reason: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("steps").is_none());
        assert!(value.get("reason").is_none());
        assert_eq!(value["state"], "done");
    }
}
