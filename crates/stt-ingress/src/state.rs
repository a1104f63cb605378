//! Application state management

use std::path::PathBuf;
use std::sync::Arc;

use stt_broker::RemoteTaskClient;
use stt_core::{context_error, context_error::Result, Config};
use stt_orchestrator::{JobOrchestrator, OrchestratorConfig};
use stt_store::Store;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Core service configuration (Mongo, broker, service name).
    pub config: Config,
    /// Cache/result store handle.
    pub store: Arc<Store>,
    /// Remote task broker handle.
    pub broker: Arc<dyn RemoteTaskClient>,
    /// Job orchestrator, shared across requests.
    pub orchestrator: Arc<JobOrchestrator>,
    /// Base directory uploaded audio is written into before a job starts.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size, in bytes, per audio field.
    pub max_upload_bytes: u64,
}

impl AppState {
    /// Create new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload directory cannot be created.
    pub fn new(
        config: Config,
        store: Arc<Store>,
        broker: Arc<dyn RemoteTaskClient>,
        orchestrator_config: Arc<OrchestratorConfig>,
        upload_dir: PathBuf,
        max_upload_bytes: u64,
    ) -> Result<Self> {
        std::fs::create_dir_all(&upload_dir)?;

        let jobs = Arc::new(dashmap::DashMap::new());
        let orchestrator = Arc::new(JobOrchestrator::new(
            orchestrator_config,
            store.clone(),
            broker.clone(),
            jobs,
        ));

        Ok(Self {
            config,
            store,
            broker,
            orchestrator,
            upload_dir,
            max_upload_bytes,
        })
    }

    /// Base upload directory.
    #[must_use]
    pub const fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }

    /// Check that the application is properly configured to serve requests.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<()> {
        if !self.upload_dir.exists() {
            return Err(context_error!(
                "Upload directory does not exist: {}",
                self.upload_dir.display()
            ));
        }

        let test_file = self.upload_dir.join(".write_test");
        std::fs::write(&test_file, "test")?;
        std::fs::remove_file(&test_file)?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stt_broker::InMemoryBroker;
    use tempfile::TempDir;

    fn test_store_uri() -> String {
        "mongodb://localhost:27017".to_string()
    }

    async fn make_state(upload_dir: PathBuf) -> AppState {
        let store = Arc::new(Store::connect(&test_store_uri()).await.unwrap());
        let broker: Arc<dyn RemoteTaskClient> = Arc::new(InMemoryBroker::with_echo());
        AppState::new(
            Config::default(),
            store,
            broker,
            Arc::new(OrchestratorConfig::default()),
            upload_dir,
            500 * 1024 * 1024,
        )
        .expect("failed to create AppState")
    }

    #[tokio::test]
    #[ignore = "requires a reachable MongoDB deployment"]
    async fn appstate_new_creates_upload_dir() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let upload_dir = temp_dir.path().join("uploads");
        let state = make_state(upload_dir.clone()).await;

        assert!(upload_dir.exists());
        assert_eq!(state.upload_dir, upload_dir);
    }

    #[tokio::test]
    #[ignore = "requires a reachable MongoDB deployment"]
    async fn validate_fails_when_directory_removed() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let upload_dir = temp_dir.path().join("uploads");
        let state = make_state(upload_dir).await;

        std::fs::remove_dir_all(&state.upload_dir).expect("failed to remove dir");

        let result = state.validate();
        assert!(result.is_err());
        assert!(format!("{}", result.unwrap_err()).contains("does not exist"));
    }

    #[tokio::test]
    #[ignore = "requires a reachable MongoDB deployment"]
    async fn appstate_clone_shares_handles() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let upload_dir = temp_dir.path().join("uploads");
        let state1 = make_state(upload_dir).await;
        let state2 = state1.clone();

        assert_eq!(state1.upload_dir, state2.upload_dir);
        assert!(Arc::ptr_eq(&state1.store, &state2.store));
    }
}
