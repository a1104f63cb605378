//! MongoDB-backed operations for the result/word cache.

use crate::models::{StoredResult, StoredTranscription, DATABASE_NAME, RESULTS_COLLECTION};
use mongodb::Client;
use stt_core::{CachedTranscription, Error, Result, TranscriptionConfig, TranscriptionResult, Word};
use tracing::warn;
use uuid::Uuid;

/// A handle to the result/word cache store.
///
/// Connects to a single MongoDB deployment and exposes the cache-read /
/// cache-write / final-result operations the orchestrator needs. Reads on
/// the per-file transcription cache are soft: any connectivity or query
/// failure is logged and treated as a cache miss rather than propagated.
/// Writing the final, client-facing result is fatal: failures there surface
/// as [`Error::DatabaseUnreachable`] so the caller can fail the job.
#[derive(Debug, Clone)]
pub struct Store {
    client: Client,
}

impl Store {
    /// Connect to MongoDB at `uri`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed or the
    /// initial driver handshake fails.
    pub async fn connect(uri: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| Error::DatabaseUnreachable {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    fn transcriptions(&self, service_name: &str) -> mongodb::Collection<StoredTranscription> {
        self.client
            .database(DATABASE_NAME)
            .collection(service_name)
    }

    fn results(&self) -> mongodb::Collection<StoredResult> {
        self.client
            .database(DATABASE_NAME)
            .collection(RESULTS_COLLECTION)
    }

    /// Look up a cached transcription by content hash within `service_name`'s
    /// collection.
    ///
    /// Soft-fails to `Ok(None)` on any store error; the caller cannot
    /// distinguish "not cached" from "cache unreachable", which is the
    /// intended behavior for the fast-path lookup.
    pub async fn fetch_transcription(
        &self,
        service_name: &str,
        file_hash: &str,
    ) -> Result<Option<CachedTranscription>> {
        match self
            .transcriptions(service_name)
            .find_one(mongodb::bson::doc! { "_id": file_hash })
            .await
        {
            Ok(Some(doc)) => Ok(Some(CachedTranscription {
                datetime: doc.datetime,
                words: doc.words,
            })),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, %file_hash, "cache lookup failed, treating as miss");
                Ok(None)
            }
        }
    }

    /// Upsert a transcription into the per-service cache collection.
    ///
    /// Best-effort: failures are logged as warnings and otherwise ignored.
    pub async fn push_transcription(
        &self,
        service_name: &str,
        file_hash: &str,
        words: Vec<Word>,
    ) -> Result<()> {
        let doc = StoredTranscription::new(file_hash, words);
        let outcome = self
            .transcriptions(service_name)
            .replace_one(mongodb::bson::doc! { "_id": file_hash }, &doc)
            .upsert(true)
            .await;
        if let Err(e) = outcome {
            warn!(error = %e, %file_hash, "failed to persist transcription cache entry");
        }
        Ok(())
    }

    /// Fetch a final result document by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseUnreachable`] if the store cannot be
    /// queried.
    pub async fn fetch_result(&self, result_id: Uuid) -> Result<Option<TranscriptionResult>> {
        let doc = self
            .results()
            .find_one(mongodb::bson::doc! { "_id": result_id })
            .await
            .map_err(|e| Error::DatabaseUnreachable {
                message: e.to_string(),
            })?;
        Ok(doc.map(|d| d.result))
    }

    /// Persist a final result, generating a fresh id for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseUnreachable`] if the write fails; the caller
    /// treats this as fatal.
    pub async fn push_result(
        &self,
        file_hash: &str,
        job_id: Uuid,
        service_name: &str,
        config: &TranscriptionConfig,
        result: &TranscriptionResult,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let doc = StoredResult {
            id,
            hash: file_hash.to_string(),
            job_id,
            service_name: service_name.to_string(),
            datetime: chrono::Utc::now(),
            config: config.clone(),
            result: result.clone(),
        };
        self.results()
            .insert_one(&doc)
            .await
            .map_err(|e| Error::DatabaseUnreachable {
                message: e.to_string(),
            })?;
        Ok(id)
    }

    /// Ping the deployment to verify connectivity, used by the health check
    /// endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseUnreachable`] if the deployment cannot be
    /// reached.
    pub async fn health_check(&self) -> Result<()> {
        self.client
            .database(DATABASE_NAME)
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await
            .map_err(|e| Error::DatabaseUnreachable {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a reachable MongoDB deployment"]
    async fn round_trips_a_transcription_cache_entry() {
        let store = Store::connect("mongodb://localhost:27017").await.unwrap();
        let words = vec![Word::new("hello", 0.0, 1.0, 0.95)];
        store
            .push_transcription("stt-test", "hash123", words.clone())
            .await
            .unwrap();
        let cached = store
            .fetch_transcription("stt-test", "hash123")
            .await
            .unwrap();
        assert_eq!(cached.unwrap().words, words);
    }

    #[tokio::test]
    #[ignore = "requires a reachable MongoDB deployment"]
    async fn push_and_fetch_a_final_result() {
        let store = Store::connect("mongodb://localhost:27017").await.unwrap();
        let result = TranscriptionResult {
            confidence: 0.9,
            words: vec![],
            segments: vec![],
            diarization_segments: vec![],
        };
        let id = store
            .push_result(
                "hash123",
                Uuid::new_v4(),
                "stt-test",
                &TranscriptionConfig::default(),
                &result,
            )
            .await
            .unwrap();
        let fetched = store.fetch_result(id).await.unwrap();
        assert_eq!(fetched, Some(result));
    }

    #[tokio::test]
    async fn connect_to_unreachable_host_fails_fast() {
        // A syntactically valid but non-resolvable host; `with_uri_str` only
        // parses the URI, so this exercises parse-time validation, not a
        // live connection attempt.
        let result = Store::connect("not-a-mongodb-uri").await;
        assert!(result.is_err());
    }
}
