//! Document shapes persisted to MongoDB.
//!
//! Mirrors the two-collection layout of the system this crate replaces: one
//! collection per service name holding raw per-file transcriptions keyed by
//! content hash, and a single shared `results` collection keyed by a fresh
//! id, holding the fully assembled, client-facing result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stt_core::{TranscriptionConfig, TranscriptionResult, Word};
use uuid::Uuid;

/// Fixed database name all collections live under.
pub const DATABASE_NAME: &str = "transcriptiondb";

/// Fixed name of the shared collection holding final results.
pub const RESULTS_COLLECTION: &str = "results";

/// A cached, per-file transcription document.
///
/// Stored in a collection named after the service that produced it, keyed by
/// the content hash of the source audio (`_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTranscription {
    /// Content hash of the source audio; the document's key.
    #[serde(rename = "_id")]
    pub file_hash: String,
    /// When this entry was written.
    pub datetime: DateTime<Utc>,
    /// The cached, merged word sequence.
    pub words: Vec<Word>,
}

impl StoredTranscription {
    /// Build the document to upsert for a given hash/word list.
    #[must_use]
    pub fn new(file_hash: impl Into<String>, words: Vec<Word>) -> Self {
        Self {
            file_hash: file_hash.into(),
            datetime: Utc::now(),
            words,
        }
    }
}

/// A final, fully assembled result document.
///
/// Stored in the shared `results` collection, keyed by a fresh uuid (`_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResult {
    /// Result id; the document's key.
    #[serde(rename = "_id")]
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

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stored_transcription_round_trips_through_bson() {
        let doc = StoredTranscription::new("abc123", vec![Word::new("hi", 0.0, 1.0, 0.9)]);
        let bson = bson::to_bson(&doc).unwrap();
        let back: StoredTranscription = bson::from_bson(bson).unwrap();
        assert_eq!(back.file_hash, "abc123");
        assert_eq!(back.words.len(), 1);
    }

    #[test]
    fn stored_result_round_trips_through_bson() {
        let doc = StoredResult {
            id: Uuid::new_v4(),
            hash: "abc123".to_string(),
            job_id: Uuid::new_v4(),
            service_name: "stt".to_string(),
            datetime: Utc::now(),
            config: TranscriptionConfig::default(),
            result: TranscriptionResult {
                confidence: 0.9,
                words: vec![],
                segments: vec![],
                diarization_segments: vec![],
            },
        };
        let bson = bson::to_bson(&doc).unwrap();
        let back: StoredResult = bson::from_bson(bson).unwrap();
        assert_eq!(back.hash, "abc123");
        assert_eq!(back.service_name, "stt");
    }
}
