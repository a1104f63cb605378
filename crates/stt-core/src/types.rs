//! Core data model shared by every orchestrator crate: words, speaker segments,
//! transcription configuration, job records and the persisted result documents.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single time-stamped, transcribed word.
///
/// Immutable after construction; [`Word::apply_offset`] returns a shifted copy
/// rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// The transcribed text of the word.
    pub text: String,
    /// Start time in seconds, relative to the sub-segment it was transcribed from.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Confidence in `[0, 1]`.
    pub conf: f64,
}

impl Word {
    /// Create a new word.
    #[must_use]
    pub fn new(text: impl Into<String>, start: f64, end: f64, conf: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            conf,
        }
    }

    /// Return a copy of this word shifted by `offset` seconds.
    #[must_use]
    pub fn apply_offset(&self, offset: f64) -> Self {
        Self {
            text: self.text.clone(),
            start: self.start + offset,
            end: self.end + offset,
            conf: self.conf,
        }
    }

    /// `true` if the word's text ends with a sentence-terminating punctuation mark.
    #[must_use]
    pub fn ends_with_terminal_punctuation(&self) -> bool {
        matches!(self.text.trim_end().chars().last(), Some('.' | '!' | '?'))
    }
}

impl PartialOrd for Word {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.start.partial_cmp(&other.start)
    }
}

/// A speaker-turn interval reported by a diarization worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiarizationSegment {
    /// Segment start time in seconds.
    pub seg_begin: f64,
    /// Segment end time in seconds.
    pub seg_end: f64,
    /// Speaker identifier.
    pub spk_id: String,
    /// Sequential segment id, as reported by the diarization worker.
    pub seg_id: i64,
}

impl DiarizationSegment {
    /// Create a new diarization segment.
    #[must_use]
    pub const fn new(seg_begin: f64, seg_end: f64, spk_id: String, seg_id: i64) -> Self {
        Self {
            seg_begin,
            seg_end,
            spk_id,
            seg_id,
        }
    }
}

/// A sequence of words attributed to a single speaker, produced by alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSegment {
    /// Speaker identifier, or `None` if diarization was unavailable.
    pub speaker_id: Option<String>,
    /// Ordered sequence of words belonging to this segment.
    pub words: Vec<Word>,
    /// Optional punctuated rendering; when `None`, the raw joined words are used.
    pub processed_text: Option<String>,
}

impl SpeechSegment {
    /// Create a new, unprocessed speech segment.
    #[must_use]
    pub const fn new(speaker_id: Option<String>, words: Vec<Word>) -> Self {
        Self {
            speaker_id,
            words,
            processed_text: None,
        }
    }

    /// Start time: the minimum word start, or `0.0` for an empty segment.
    #[must_use]
    pub fn start(&self) -> f64 {
        self.words.first().map_or(0.0, |w| w.start)
    }

    /// End time: the maximum word end, or `0.0` for an empty segment.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.words.last().map_or(0.0, |w| w.end)
    }

    /// Duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end() - self.start()
    }

    /// The raw, space-joined text of the segment's words.
    #[must_use]
    pub fn raw_segment(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The rendering used in `transcription_result`: the punctuated text if set,
    /// otherwise the raw joined words, optionally prefixed with the speaker id.
    #[must_use]
    pub fn to_string_with_speaker(&self, include_spk_id: bool, spk_sep: &str) -> String {
        let text = self
            .processed_text
            .clone()
            .unwrap_or_else(|| self.raw_segment());
        if include_spk_id {
            if let Some(spk) = &self.speaker_id {
                return format!("{spk}{spk_sep}{text}");
            }
        }
        text
    }

    /// Record the punctuated rendering for this segment.
    pub fn set_processed_text(&mut self, processed: impl Into<String>) {
        self.processed_text = Some(processed.into());
    }
}

/// Aggregate transcription output: merged words, speaker segments and the
/// diarization segments they were aligned against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Mean word confidence across all merged sub-transcriptions.
    pub confidence: f64,
    /// Ordered sequence of all words, time-sorted.
    pub words: Vec<Word>,
    /// Ordered sequence of speech segments.
    pub segments: Vec<SpeechSegment>,
    /// Normalized diarization segments used to produce `segments`.
    pub diarization_segments: Vec<DiarizationSegment>,
}

impl TranscriptionResult {
    /// Mean confidence across `words`, or `0.0` for an empty word list.
    #[must_use]
    pub fn mean_confidence(words: &[Word]) -> f64 {
        if words.is_empty() {
            return 0.0;
        }
        words.iter().map(|w| w.conf).sum::<f64>() / words.len() as f64
    }

    /// The `raw_transcription` field of the persisted result: all words joined by a single space.
    #[must_use]
    pub fn raw_transcription(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The `transcription_result` field: speaker-prefixed segments joined by newline.
    #[must_use]
    pub fn transcription_result_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.to_string_with_speaker(true, ": "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Voice-activity-detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VadConfig {
    /// Whether VAD-based segmentation is enabled.
    #[serde(default = "default_true")]
    pub enable_vad: bool,
    /// Name of the VAD method in use.
    #[serde(default = "default_vad_method")]
    pub method_name: String,
    /// Minimum segment duration, in seconds.
    #[serde(default)]
    pub min_duration: f64,
    /// Maximum segment duration, in seconds, or `None` for unbounded.
    #[serde(default)]
    pub max_duration: Option<f64>,
}

fn default_true() -> bool {
    true
}

fn default_vad_method() -> String {
    "WebRTC".to_string()
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            enable_vad: true,
            method_name: default_vad_method(),
            min_duration: 0.0,
            max_duration: None,
        }
    }
}

/// Diarization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiarizationConfig {
    /// Whether diarization is enabled.
    #[serde(default)]
    pub enable_diarization: bool,
    /// Fixed number of speakers, if known in advance.
    #[serde(default)]
    pub number_of_speaker: Option<u32>,
    /// Upper bound on the number of speakers to detect.
    #[serde(default)]
    pub max_number_of_speaker: Option<u32>,
    /// Pinned worker queue/service name, if any.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Resolved live queue name, written by the service resolver.
    #[serde(default)]
    pub service_queue: Option<String>,
    /// Set by the service resolver once the task has been bound to a queue.
    #[serde(default)]
    pub is_available: bool,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            enable_diarization: false,
            number_of_speaker: None,
            max_number_of_speaker: None,
            service_name: None,
            service_queue: None,
            is_available: false,
        }
    }
}

impl DiarizationConfig {
    /// Enforce the documented invariants:
    /// `numberOfSpeaker == 1` disables diarization; when both speaker counts are
    /// set, `maxNumberOfSpeaker` is clamped down to `numberOfSpeaker`.
    pub fn normalize(&mut self) {
        if self.number_of_speaker == Some(1) {
            self.enable_diarization = false;
        }
        if let (Some(n), Some(max)) = (self.number_of_speaker, self.max_number_of_speaker) {
            if max > n {
                self.max_number_of_speaker = Some(n);
            }
        }
    }
}

/// Punctuation-restoration configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PunctuationConfig {
    /// Whether punctuation restoration is enabled.
    #[serde(default)]
    pub enable_punctuation: bool,
    /// Pinned worker queue/service name, if any.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Resolved live queue name, written by the service resolver.
    #[serde(default)]
    pub service_queue: Option<String>,
    /// Set by the service resolver once the task has been bound to a queue.
    #[serde(default)]
    pub is_available: bool,
}

impl Default for PunctuationConfig {
    fn default() -> Self {
        Self {
            enable_punctuation: false,
            service_name: None,
            service_queue: None,
            is_available: false,
        }
    }
}

/// The full, client-supplied transcription configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionConfig {
    /// Voice-activity-detection sub-config.
    #[serde(default)]
    pub vad_config: VadConfig,
    /// Diarization sub-config.
    #[serde(default)]
    pub diarization_config: DiarizationConfig,
    /// Punctuation sub-config.
    #[serde(default)]
    pub punctuation_config: PunctuationConfig,
    /// Legacy top-level flag; overrides `punctuationConfig.enablePunctuation` when set.
    #[serde(default)]
    pub enable_punctuation: Option<bool>,
    /// Legacy, unconsumed flag preserved only for round-tripping.
    #[serde(default)]
    pub transcribe_per_channel: bool,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        let mut config = Self {
            vad_config: VadConfig::default(),
            diarization_config: DiarizationConfig::default(),
            punctuation_config: PunctuationConfig::default(),
            enable_punctuation: None,
            transcribe_per_channel: false,
        };
        config.normalize();
        config
    }
}

impl TranscriptionConfig {
    /// Apply cross-field invariants: the diarization clamp/disable rule, and
    /// the legacy top-level `enablePunctuation` override.
    pub fn normalize(&mut self) {
        self.diarization_config.normalize();
        if let Some(legacy) = self.enable_punctuation {
            self.punctuation_config.enable_punctuation = legacy;
        }
    }

    /// Force-disable diarization, as required once external timestamps have
    /// been supplied for segmentation.
    pub fn disable_diarization_for_external_timestamps(&mut self) {
        self.diarization_config.enable_diarization = false;
    }

    /// A stable JSON rendering used as one half of the cache key signature.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, which cannot happen for this
    /// type under normal conditions.
    pub fn vad_signature_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.vad_config)
    }
}

/// Lifecycle state of an orchestrator job, as observed through the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum JobState {
    /// Submitted, but no `Sent` sentinel has been recorded yet (or the id is unknown).
    Pending,
    /// A `Sent` sentinel has been recorded by the ingress at submit time.
    Sent,
    /// The orchestrator has begun processing.
    Started,
    /// Processing completed successfully.
    Success,
    /// Processing terminated in a fatal error.
    Failure,
}

/// Progress of a single named step in the orchestrator's state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Current state of this step.
    pub state: JobState,
    /// Fractional progress in `[0, 1]`.
    pub progress: f64,
}

impl StepProgress {
    /// A step that has not started yet.
    #[must_use]
    pub const fn not_started() -> Self {
        Self {
            state: JobState::Pending,
            progress: 0.0,
        }
    }
}

/// The orchestrator's in-memory record of one job's progress, keyed by job id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// The job's id, also the key used in the broker's result backend.
    pub job_id: Uuid,
    /// Overall job state.
    pub state: JobState,
    /// Per-step progress, keyed by step name (`preprocessing`, `transcription`, ...).
    pub steps: HashMap<String, StepProgress>,
    /// Id of the persisted `FinalResult`, once available.
    pub result_id: Option<Uuid>,
    /// Failure reason, once the job has failed.
    pub error: Option<String>,
}

impl JobRecord {
    /// Create a fresh record in the `Sent` state with no steps yet recorded.
    #[must_use]
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            state: JobState::Sent,
            steps: HashMap::new(),
            result_id: None,
            error: None,
        }
    }

    /// Record a step transition.
    pub fn update_step(&mut self, step: impl Into<String>, state: JobState, progress: f64) {
        self.steps.insert(step.into(), StepProgress { state, progress });
    }

    /// Mark the job as terminally failed with `reason`, annotated with the failing step.
    pub fn fail(&mut self, step: &str, reason: impl Into<String>) {
        let reason = reason.into();
        self.state = JobState::Failure;
        self.error = Some(format!("{step}: {reason}"));
        self.update_step(step, JobState::Failure, 0.0);
    }

    /// Mark the job as successfully completed with the given result id.
    pub fn succeed(&mut self, result_id: Uuid) {
        self.state = JobState::Success;
        self.result_id = Some(result_id);
    }
}

/// A per-file word cache entry, keyed by content+config hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedTranscription {
    /// When this cache entry was written.
    pub datetime: DateTime<Utc>,
    /// The cached, merged word sequence.
    pub words: Vec<Word>,
}

impl CachedTranscription {
    /// Create a new cache entry stamped with the current time.
    #[must_use]
    pub fn new(words: Vec<Word>) -> Self {
        Self {
            datetime: Utc::now(),
            words,
        }
    }
}

/// A single rendered speech segment, as it appears in a persisted [`FinalResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResultSegment {
    /// Speaker id, or `null` if diarization was unavailable.
    pub spk_id: Option<String>,
    /// Segment start time in seconds.
    pub start: f64,
    /// Segment end time in seconds.
    pub end: f64,
    /// Segment duration in seconds.
    pub duration: f64,
    /// Raw, unprocessed text (words joined by space).
    pub raw_segment: String,
    /// Punctuated/processed text, falling back to `raw_segment`.
    pub segment: String,
    /// The segment's words.
    pub words: Vec<Word>,
}

impl From<&SpeechSegment> for FinalResultSegment {
    fn from(s: &SpeechSegment) -> Self {
        Self {
            spk_id: s.speaker_id.clone(),
            start: s.start(),
            end: s.end(),
            duration: s.duration(),
            raw_segment: s.raw_segment(),
            segment: s
                .processed_text
                .clone()
                .unwrap_or_else(|| s.raw_segment()),
            words: s.words.clone(),
        }
    }
}

/// The stable, persisted document shape described in the external-interfaces
/// contract: the exact JSON body returned by `GET /results/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResultDocument {
    /// Speaker-prefixed, newline-joined transcript.
    pub transcription_result: String,
    /// Words joined by a single space, with no speaker attribution.
    pub raw_transcription: String,
    /// Mean word confidence.
    pub confidence: f64,
    /// Rendered speech segments.
    pub segments: Vec<FinalResultSegment>,
    /// Normalized diarization segments.
    pub diarization_segments: Vec<DiarizationSegment>,
}

impl From<&TranscriptionResult> for FinalResultDocument {
    fn from(result: &TranscriptionResult) -> Self {
        Self {
            transcription_result: result.transcription_result_text(),
            raw_transcription: result.raw_transcription(),
            confidence: result.confidence,
            segments: result.segments.iter().map(FinalResultSegment::from).collect(),
            diarization_segments: result.diarization_segments.clone(),
        }
    }
}

/// A persisted final result, keyed by a freshly generated uuid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    /// Result id; the document's key in the shared `results` collection.
    pub id: Uuid,
    /// Content hash of the source audio, linking back to the cache entry.
    pub hash: String,
    /// Id of the job that produced this result.
    pub job_id: Uuid,
    /// Name of the service that ran the job.
    pub service_name: String,
    /// When this result was written.
    pub datetime: DateTime<Utc>,
    /// The configuration the job was run with.
    pub config: TranscriptionConfig,
    /// The full transcription result.
    pub result: TranscriptionResult,
}

impl FinalResult {
    /// Render this result as the stable, client-facing document.
    #[must_use]
    pub fn to_document(&self) -> FinalResultDocument {
        FinalResultDocument::from(&self.result)
    }
}
