//! `POST /transcribe` and `POST /transcribe-multi` (§4.G.1, §5, §6).
//!
//! Both endpoints accept `multipart/form-data`: an `audio` file (repeated for
//! the multi-file variant), an optional `timestamps` text field (§6's
//! external-timestamps format), an optional `transcriptionConfig` JSON
//! field, and the `force_sync`/`no_cache` boolean form fields (Supplemented
//! Features).

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use stt_core::types::TranscriptionConfig;
use stt_core::utils::md5_hex;
use stt_orchestrator::{JobInput, MultiJobInput};

use crate::state::AppState;

/// Parsed multipart fields common to both endpoints.
#[derive(Default)]
struct UploadFields {
    audio_files: Vec<(String, Vec<u8>)>,
    timestamps: Option<String>,
    transcription_config: Option<String>,
    force_sync: bool,
    no_cache: bool,
}

/// `202`/`201` response body for `/transcribe` and `/transcribe-multi`.
#[derive(Debug, Serialize)]
struct UploadResponse {
    jobid: Uuid,
}

/// Error body shared by every failure path on the upload endpoints.
#[derive(Debug, Serialize)]
struct UploadError {
    error: String,
}

fn bad_request(message: impl Into<String>) -> Response {
    let message = message.into();
    warn!(%message, "rejecting upload");
    (StatusCode::BAD_REQUEST, Json(UploadError { error: message })).into_response()
}

fn server_error(message: impl Into<String>) -> Response {
    let message = message.into();
    error!(%message, "upload failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(UploadError { error: message })).into_response()
}

async fn parse_multipart(mut multipart: Multipart, max_upload_bytes: u64) -> Result<UploadFields, Response> {
    let mut fields = UploadFields::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(bad_request(format!("invalid multipart data: {e}"))),
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "audio" => {
                let filename = field.file_name().unwrap_or("audio").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("failed to read audio field: {e}")))?;
                if bytes.len() as u64 > max_upload_bytes {
                    return Err(bad_request(format!(
                        "audio file {filename} exceeds maximum upload size of {max_upload_bytes} bytes"
                    )));
                }
                fields.audio_files.push((filename, bytes.to_vec()));
            }
            "timestamps" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("failed to read timestamps field: {e}")))?;
                fields.timestamps = Some(text);
            }
            "transcriptionConfig" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("failed to read transcriptionConfig field: {e}")))?;
                fields.transcription_config = Some(text);
            }
            "force_sync" => {
                let text = field.text().await.unwrap_or_default();
                fields.force_sync = parse_bool_field(&text);
            }
            "no_cache" => {
                let text = field.text().await.unwrap_or_default();
                fields.no_cache = parse_bool_field(&text);
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(fields)
}

fn parse_bool_field(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Parse the external-timestamps text format (§6): one record per line,
/// space-separated `start end [spk_id]`, blank lines ignored.
fn parse_timestamps(text: &str) -> Result<Vec<(f64, f64, Option<String>)>, String> {
    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let start = parts
            .next()
            .ok_or_else(|| format!("malformed timestamps line: {line:?}"))?
            .parse::<f64>()
            .map_err(|e| format!("invalid start time in {line:?}: {e}"))?;
        let end = parts
            .next()
            .ok_or_else(|| format!("malformed timestamps line: {line:?}"))?
            .parse::<f64>()
            .map_err(|e| format!("invalid end time in {line:?}: {e}"))?;
        let spk_id = parts.next().map(ToString::to_string);
        records.push((start, end, spk_id));
    }
    Ok(records)
}

async fn write_scratch_file(state: &AppState, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let hash = md5_hex(bytes);
    let random = Uuid::new_v4().simple().to_string();
    let path = state.upload_dir().join(format!("{hash}_{random}"));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

fn parse_config(fields: &UploadFields) -> Result<TranscriptionConfig, Response> {
    match &fields.transcription_config {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| bad_request(format!("malformed transcriptionConfig: {e}"))),
        None => Ok(TranscriptionConfig::default()),
    }
}

/// `POST /transcribe`: a single audio file, driven through the full job
/// state machine.
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = match parse_multipart(multipart, state.max_upload_bytes).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    if fields.audio_files.len() != 1 {
        return bad_request("/transcribe requires exactly one audio field");
    }
    let (_, audio_bytes) = fields.audio_files.into_iter().next().expect("checked len == 1");

    let mut config = match parse_config(&fields) {
        Ok(config) => config,
        Err(response) => return response,
    };
    config.normalize();

    let external_timestamps = match fields.timestamps.as_deref().map(parse_timestamps) {
        Some(Ok(records)) => Some(records),
        Some(Err(message)) => return bad_request(message),
        None => None,
    };

    let audio_path = match write_scratch_file(&state, &audio_bytes).await {
        Ok(path) => path,
        Err(e) => return server_error(format!("failed to stage upload: {e}")),
    };

    let job_id = Uuid::new_v4();
    let input = JobInput {
        audio_path,
        audio_bytes,
        config,
        external_timestamps,
        service_name: state.config.service_name.clone(),
        no_cache: fields.no_cache,
    };

    state.orchestrator.mark_sent(job_id);

    if fields.force_sync {
        return match state.orchestrator.run(job_id, input).await {
            Ok(result_id) => respond_with_result(&state, result_id, &headers).await,
            Err(e) => server_error(e.to_string()),
        };
    }

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        if let Err(e) = orchestrator.run(job_id, input).await {
            warn!(%job_id, error = %e, "background job failed");
        }
    });

    info!(%job_id, "job submitted");
    (StatusCode::CREATED, Json(UploadResponse { jobid: job_id })).into_response()
}

/// `POST /transcribe-multi`: the legacy batch path (Supplemented Feature).
/// Each file is transcribed whole, with diarization and punctuation
/// disabled, under the fixed pseudo-hash `"multifile"`.
pub async fn transcribe_multi(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = match parse_multipart(multipart, state.max_upload_bytes).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    if fields.audio_files.len() < 2 {
        return bad_request("/transcribe-multi requires at least two audio fields");
    }

    let config = match parse_config(&fields) {
        Ok(config) => config,
        Err(response) => return response,
    };

    let mut audio_paths = Vec::with_capacity(fields.audio_files.len());
    for (_, bytes) in &fields.audio_files {
        match write_scratch_file(&state, bytes).await {
            Ok(path) => audio_paths.push(path),
            Err(e) => return server_error(format!("failed to stage upload: {e}")),
        }
    }

    let job_id = Uuid::new_v4();
    let input = MultiJobInput {
        audio_paths,
        config,
        service_name: state.config.service_name.clone(),
    };

    state.orchestrator.mark_sent(job_id);

    if fields.force_sync {
        return match state.orchestrator.run_multi(job_id, input).await {
            Ok(result_id) => respond_with_result(&state, result_id, &headers).await,
            Err(e) => server_error(e.to_string()),
        };
    }

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        if let Err(e) = orchestrator.run_multi(job_id, input).await {
            warn!(%job_id, error = %e, "background multi-file job failed");
        }
    });

    info!(%job_id, "multi-file job submitted");
    (StatusCode::CREATED, Json(UploadResponse { jobid: job_id })).into_response()
}

/// When `force_sync` is set, render the freshly persisted result directly
/// instead of returning a job id, negotiating format the same way
/// `/results/{id}` does.
async fn respond_with_result(state: &AppState, result_id: Uuid, headers: &HeaderMap) -> Response {
    let accept = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json");

    let Some(format) = crate::format::ResultFormat::from_accept_header(accept) else {
        return bad_request(format!("unsupported Accept header: {accept}"));
    };

    match state.store.fetch_result(result_id).await {
        Ok(Some(result)) => {
            let document = result.to_document();
            (
                [(axum::http::header::CONTENT_TYPE, format.content_type())],
                crate::format::render(&document, format),
            )
                .into_response()
        }
        Ok(None) => server_error("result vanished immediately after persistence"),
        Err(e) => server_error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_well_formed_timestamps() {
        let text = "0.0 1.5 A\n1.5 3.0 B\n\n3.0 4.0\n";
        let records = parse_timestamps(text).unwrap();
        assert_eq!(
            records,
            vec![
                (0.0, 1.5, Some("A".to_string())),
                (1.5, 3.0, Some("B".to_string())),
                (3.0, 4.0, None),
            ]
        );
    }

    #[test]
    fn rejects_malformed_timestamps_line() {
        assert!(parse_timestamps("not-a-number 1.0").is_err());
        assert!(parse_timestamps("1.0").is_err());
    }

    #[test]
    fn parses_bool_form_fields_case_insensitively() {
        assert!(parse_bool_field("true"));
        assert!(parse_bool_field("TRUE"));
        assert!(parse_bool_field("1"));
        assert!(!parse_bool_field("false"));
        assert!(!parse_bool_field(""));
    }
}
