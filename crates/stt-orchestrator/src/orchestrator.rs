//! Job orchestrator (§4.F): drives a single transcription job through
//! resolution, pre-processing, parallel transcription/diarization fan-out,
//! alignment, optional punctuation and persistence, publishing step-level
//! progress into a shared [`JobRecord`] table as it goes.
//!
//! `#[instrument]` is applied to each public step the way the teacher
//! instruments its own service lifecycle transitions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use stt_broker::RemoteTaskClient;
use stt_core::aligner;
use stt_core::types::{
    CachedTranscription, DiarizationSegment, JobRecord, JobState, TranscriptionConfig,
    TranscriptionResult, Word,
};
use stt_core::utils::content_hash;
use stt_core::Result;
use stt_store::Store;

use crate::config::OrchestratorConfig;
use crate::resolver;
use crate::segmenter::{self, SubSegment};

/// Everything the orchestrator needs to run one job.
#[derive(Debug, Clone)]
pub struct JobInput {
    /// Path to the uploaded audio file, as written to the scratch directory.
    pub audio_path: PathBuf,
    /// Raw audio bytes, used only to compute the content hash.
    pub audio_bytes: Vec<u8>,
    /// The client-supplied transcription configuration.
    pub config: TranscriptionConfig,
    /// Externally supplied timestamps, if segmentation mode 1 applies.
    pub external_timestamps: Option<Vec<(f64, f64, Option<String>)>>,
    /// The service name this job runs under.
    pub service_name: String,
    /// Skip the cache-hit fast path even if a matching entry exists.
    pub no_cache: bool,
}

/// Input to the legacy multi-file submission path (`/transcribe-multi`).
///
/// Each file is transcribed whole, with no VAD splitting, diarization, or
/// punctuation; their words are merged in submission order into a single job.
#[derive(Debug, Clone)]
pub struct MultiJobInput {
    /// Paths to the uploaded audio files, as written to the scratch directory.
    pub audio_paths: Vec<PathBuf>,
    /// The client-supplied transcription configuration. Diarization and
    /// punctuation are disabled unconditionally regardless of this value.
    pub config: TranscriptionConfig,
    /// The service name this job runs under.
    pub service_name: String,
}

/// Drives one job's lifecycle end to end.
pub struct JobOrchestrator {
    config: Arc<OrchestratorConfig>,
    store: Arc<Store>,
    broker: Arc<dyn RemoteTaskClient>,
    jobs: Arc<DashMap<Uuid, JobRecord>>,
    revoked: Arc<DashMap<Uuid, ()>>,
}

impl JobOrchestrator {
    /// Build a new orchestrator sharing the given store, broker and job table.
    #[must_use]
    pub fn new(
        config: Arc<OrchestratorConfig>,
        store: Arc<Store>,
        broker: Arc<dyn RemoteTaskClient>,
        jobs: Arc<DashMap<Uuid, JobRecord>>,
    ) -> Self {
        Self {
            config,
            store,
            broker,
            jobs,
            revoked: Arc::new(DashMap::new()),
        }
    }

    /// Look up a job's current record, for the status-polling endpoint.
    #[must_use]
    pub fn job(&self, job_id: Uuid) -> Option<JobRecord> {
        self.jobs.get(&job_id).map(|r| r.clone())
    }

    /// Seed a `Sent` record for `job_id` before handing the job off to a
    /// background task, so a client that polls immediately after receiving
    /// its `201` sees `pending` rather than `404 unknown jobid` (§5).
    pub fn mark_sent(&self, job_id: Uuid) {
        self.jobs.insert(job_id, JobRecord::new(job_id));
    }

    /// Mark a job revoked (§5 Cancellation). The orchestrator observes this
    /// cooperatively at its next suspension point and aborts the job without
    /// persisting a result.
    pub fn revoke(&self, job_id: Uuid) {
        self.revoked.insert(job_id, ());
        if let Some(mut record) = self.jobs.get_mut(&job_id) {
            record.fail("revoked", "job revoked");
        }
    }

    fn is_revoked(&self, job_id: Uuid) -> bool {
        self.revoked.contains_key(&job_id)
    }

    fn update_step(&self, job_id: Uuid, step: &str, state: JobState, progress: f64) {
        if let Some(mut record) = self.jobs.get_mut(&job_id) {
            record.update_step(step, state, progress);
        }
    }

    fn fail(&self, job_id: Uuid, step: &str, reason: impl Into<String>) -> stt_core::Error {
        let reason = reason.into();
        if let Some(mut record) = self.jobs.get_mut(&job_id) {
            record.fail(step, reason.clone());
        }
        warn!(job_id = %job_id, step, %reason, "job failed");
        stt_core::Error::Other(format!("{step}: {reason}"))
    }

    /// Run a single-file job through the full state machine, returning the
    /// persisted result's id.
    ///
    /// # Errors
    ///
    /// Returns an error (and transitions the job record to `Failure`) if
    /// resolution, transcoding, any sub-transcription, diarization,
    /// punctuation, or final persistence fails.
    #[instrument(skip(self, input), fields(job_id = %job_id))]
    pub async fn run(&self, job_id: Uuid, mut input: JobInput) -> Result<Uuid> {
        self.jobs.insert(job_id, JobRecord::new(job_id));

        // Resolving
        if input.external_timestamps.is_some() {
            input.config.disable_diarization_for_external_timestamps();
        }
        if let Err(e) = resolver::resolve(&mut input.config, &self.config.known_services) {
            return Err(self.fail(job_id, "resolving", e.to_string()));
        }

        // Preprocessing
        self.update_step(job_id, "preprocessing", JobState::Started, 0.0);
        let hash = content_hash(
            &input.audio_bytes,
            &input.config,
            input.external_timestamps.as_deref(),
        )?;

        let diarization_enabled = input.config.diarization_config.enable_diarization;
        let diarization_handle = if diarization_enabled {
            self.update_step(job_id, "diarization", JobState::Sent, 0.0);
            let queue = input
                .config
                .diarization_config
                .service_queue
                .clone()
                .unwrap_or_default();
            Some(
                self.broker
                    .submit(
                        "diarize",
                        &queue,
                        serde_json::json!({ "audio_path": input.audio_path.clone() }),
                    )
                    .await
                    .map_err(|e| self.fail(job_id, "diarization", e.to_string()))?,
            )
        } else {
            None
        };

        let cached = if input.no_cache || input.external_timestamps.is_some() {
            None
        } else {
            self.store.fetch_transcription(&input.service_name, &hash).await?
        };

        let words = if let Some(CachedTranscription { words, .. }) = cached {
            info!(job_id = %job_id, "cache hit, skipping fan-out");
            self.update_step(job_id, "preprocessing", JobState::Success, 1.0);
            words
        } else {
            let canonical_path = segmenter::transcode(
                &self.config.segmentation.ffmpeg_path,
                &input.audio_path,
            )
            .await?;

            let vad_config = input.config.vad_config.clone();
            let external_timestamps = input.external_timestamps.clone();
            let min_silence = self.config.segmentation.min_silence_seconds;
            let min_length = self.config.segmentation.min_length_seconds;
            let split_path = canonical_path.clone();
            let (sub_segments, _stats) = tokio::task::spawn_blocking(move || {
                segmenter::split(
                    &split_path,
                    &vad_config,
                    external_timestamps.as_deref(),
                    min_silence,
                    min_length,
                )
            })
            .await
            .map_err(|e| stt_core::Error::Other(e.to_string()))??;

            self.update_step(job_id, "preprocessing", JobState::Success, 1.0);

            let words = self
                .fan_out_transcriptions(job_id, &sub_segments, &canonical_path)
                .await?;

            if !self.config.storage.keep_audio && canonical_path != input.audio_path {
                let _ = tokio::fs::remove_file(&canonical_path).await;
            }

            if let Err(e) = self.store.push_transcription(&input.service_name, &hash, words.clone()).await {
                warn!(job_id = %job_id, error = %e, "intermediate cache write failed, continuing");
            }

            words
        };

        // Diarization: await after word merge.
        let diarization_segments: Vec<DiarizationSegment> = if let Some(handle) = diarization_handle {
            let value = handle
                .get(false)
                .await
                .map_err(|e| self.fail(job_id, "diarization", e.to_string()))?;
            self.update_step(job_id, "diarization", JobState::Success, 1.0);
            serde_json::from_value(value).unwrap_or_default()
        } else {
            Vec::new()
        };

        let normalized = aligner::normalize_diarization_segments(&diarization_segments, &words);
        let mut segments = aligner::align(&words, &normalized);

        // Punctuation: sequential, after alignment.
        if input.config.punctuation_config.enable_punctuation {
            self.update_step(job_id, "punctuation", JobState::Sent, 0.0);
            let queue = input
                .config
                .punctuation_config
                .service_queue
                .clone()
                .unwrap_or_default();
            let texts: Vec<String> = segments.iter().map(stt_core::types::SpeechSegment::raw_segment).collect();
            let handle = self
                .broker
                .submit("punctuate", &queue, serde_json::json!({ "segments": texts }))
                .await
                .map_err(|e| self.fail(job_id, "punctuation", e.to_string()))?;
            let value = handle
                .get(false)
                .await
                .map_err(|e| self.fail(job_id, "punctuation", e.to_string()))?;
            let processed: Vec<String> = serde_json::from_value(value).unwrap_or_default();
            for (segment, processed_text) in segments.iter_mut().zip(processed) {
                segment.set_processed_text(processed_text);
            }
            self.update_step(job_id, "punctuation", JobState::Success, 1.0);
        }

        // Postprocess + persist.
        self.update_step(job_id, "postprocessing", JobState::Started, 0.0);
        let confidence = TranscriptionResult::mean_confidence(&words);
        let result = TranscriptionResult {
            confidence,
            words,
            segments,
            diarization_segments: normalized,
        };

        let result_id = self
            .store
            .push_result(&hash, job_id, &input.service_name, &input.config, &result)
            .await
            .map_err(|e| self.fail(job_id, "postprocessing", e.to_string()))?;
        self.update_step(job_id, "postprocessing", JobState::Success, 1.0);

        if !self.config.storage.keep_audio {
            let _ = tokio::fs::remove_file(&input.audio_path).await;
        }

        if let Some(mut record) = self.jobs.get_mut(&job_id) {
            record.succeed(result_id);
        }
        self.revoked.remove(&job_id);
        info!(job_id = %job_id, %result_id, "job persisted");

        Ok(result_id)
    }

    /// Run the legacy multi-file submission path: `N` whole files become one
    /// job under the fixed pseudo-hash `"multifile"`, each file transcribed
    /// without VAD splitting, with diarization and punctuation skipped
    /// unconditionally (Supplemented Feature, legacy `transcription_task_multi`).
    ///
    /// # Errors
    ///
    /// Returns an error (and transitions the job record to `Failure`) if any
    /// file's transcription or final persistence fails.
    #[instrument(skip(self, input), fields(job_id = %job_id))]
    pub async fn run_multi(&self, job_id: Uuid, input: MultiJobInput) -> Result<Uuid> {
        const PSEUDO_HASH: &str = "multifile";

        self.jobs.insert(job_id, JobRecord::new(job_id));

        let mut config = input.config;
        config.diarization_config.enable_diarization = false;
        config.punctuation_config.enable_punctuation = false;

        self.update_step(job_id, "transcription", JobState::Sent, 0.0);

        let mut handles = Vec::with_capacity(input.audio_paths.len());
        for path in &input.audio_paths {
            let handle = self
                .broker
                .submit(
                    "transcribe",
                    "transcription",
                    serde_json::json!({ "path": path.clone() }),
                )
                .await
                .map_err(|e| self.fail(job_id, "transcription", e.to_string()))?;
            handles.push(handle);
        }

        let mut words = Vec::new();
        for (index, (handle, path)) in handles.iter().zip(&input.audio_paths).enumerate() {
            if self.is_revoked(job_id) {
                for (later_handle, later_path) in handles.iter().zip(&input.audio_paths).skip(index) {
                    later_handle.revoke().await;
                    if !self.config.storage.keep_audio {
                        let _ = tokio::fs::remove_file(later_path).await;
                    }
                }
                return Err(self.fail(job_id, "transcription", "job revoked"));
            }
            match handle.get(false).await {
                Ok(value) => {
                    let file_words: Vec<Word> = serde_json::from_value(value).map_err(|e| {
                        self.fail(job_id, "transcription", format!("malformed sub-transcription: {e}"))
                    })?;
                    words.extend(file_words);
                    if !self.config.storage.keep_audio {
                        let _ = tokio::fs::remove_file(path).await;
                    }
                }
                Err(e) => {
                    for (later_handle, later_path) in handles.iter().zip(&input.audio_paths).skip(index + 1) {
                        later_handle.revoke().await;
                        if !self.config.storage.keep_audio {
                            let _ = tokio::fs::remove_file(later_path).await;
                        }
                    }
                    return Err(self.fail(
                        job_id,
                        "transcription",
                        format!("file {index} failed: {e}"),
                    ));
                }
            }
        }
        self.update_step(job_id, "transcription", JobState::Success, 1.0);

        // No diarization segments: alignment collapses to one speakerless segment.
        let segments = aligner::align(&words, &[]);

        self.update_step(job_id, "postprocessing", JobState::Started, 0.0);
        let confidence = TranscriptionResult::mean_confidence(&words);
        let result = TranscriptionResult {
            confidence,
            words,
            segments,
            diarization_segments: Vec::new(),
        };

        let result_id = self
            .store
            .push_result(PSEUDO_HASH, job_id, &input.service_name, &config, &result)
            .await
            .map_err(|e| self.fail(job_id, "postprocessing", e.to_string()))?;
        self.update_step(job_id, "postprocessing", JobState::Success, 1.0);

        if let Some(mut record) = self.jobs.get_mut(&job_id) {
            record.succeed(result_id);
        }
        self.revoked.remove(&job_id);
        info!(job_id = %job_id, %result_id, "multi-file job persisted");

        Ok(result_id)
    }

    /// Submit each sub-segment's transcription task in submission (time)
    /// order, then await them in that same order, applying each
    /// sub-segment's offset to its returned words. On the first failure,
    /// revoke every outstanding handle and remove its sub-audio before
    /// failing the job (§4.F.4).
    async fn fan_out_transcriptions(
        &self,
        job_id: Uuid,
        sub_segments: &[SubSegment],
        canonical_path: &Path,
    ) -> Result<Vec<Word>> {
        self.update_step(job_id, "transcription", JobState::Sent, 0.0);

        let mut handles = Vec::with_capacity(sub_segments.len());
        for segment in sub_segments {
            let handle = self
                .broker
                .submit(
                    "transcribe",
                    "transcription",
                    serde_json::json!({ "path": segment.path.clone() }),
                )
                .await
                .map_err(|e| self.fail(job_id, "transcription", e.to_string()))?;
            handles.push(handle);
        }

        let mut merged = Vec::new();
        for (index, (handle, segment)) in handles.iter().zip(sub_segments).enumerate() {
            if self.is_revoked(job_id) {
                for (later_handle, later_segment) in handles.iter().zip(sub_segments).skip(index) {
                    later_handle.revoke().await;
                    if later_segment.path.as_path() != canonical_path {
                        let _ = tokio::fs::remove_file(&later_segment.path).await;
                    }
                }
                return Err(self.fail(job_id, "transcription", "job revoked"));
            }
            match handle.get(false).await {
                Ok(value) => {
                    let sub_words: Vec<Word> = serde_json::from_value(value).map_err(|e| {
                        self.fail(job_id, "transcription", format!("malformed sub-transcription: {e}"))
                    })?;
                    for word in sub_words {
                        merged.push(word.apply_offset(segment.offset));
                    }
                    if segment.path.as_path() != canonical_path {
                        let _ = tokio::fs::remove_file(&segment.path).await;
                    }
                }
                Err(e) => {
                    for (later_handle, later_segment) in handles.iter().zip(sub_segments).skip(index + 1) {
                        later_handle.revoke().await;
                        if later_segment.path.as_path() != canonical_path {
                            let _ = tokio::fs::remove_file(&later_segment.path).await;
                        }
                    }
                    return Err(self.fail(
                        job_id,
                        "transcription",
                        format!("sub-segment {index} failed: {e}"),
                    ));
                }
            }
        }

        self.update_step(job_id, "transcription", JobState::Success, 1.0);
        Ok(merged)
    }
}
