//! Configuration for the job orchestrator process: scratch directories, the
//! external transcoder, segmentation tuning, and the statically configured
//! worker-queue registry the service resolver matches against.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::{QueueAdvertisement, ServiceType};

/// Top-level orchestrator process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Segmentation tuning.
    pub segmentation: SegmentationConfig,

    /// Scratch/processing directories.
    pub storage: StorageConfig,

    /// Process-level service/shutdown behavior.
    pub service: ServiceConfig,

    /// Statically known auxiliary worker queues, consulted by the service
    /// resolver (§4.B) in lieu of broker-side queue introspection.
    #[serde(default)]
    pub known_services: Vec<QueueAdvertisement>,
}

/// Audio segmenter tuning (§4.A).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Path to the external transcoder binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Minimum silence run length, in seconds, that qualifies as a cut point.
    #[serde(default = "default_min_silence_seconds")]
    pub min_silence_seconds: f64,

    /// Below this total duration, segmentation is bypassed entirely.
    #[serde(default = "default_min_length_seconds")]
    pub min_length_seconds: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            min_silence_seconds: default_min_silence_seconds(),
            min_length_seconds: default_min_length_seconds(),
        }
    }
}

/// Scratch directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory sub-segment and transcoded files are written into.
    pub scratch_directory: PathBuf,

    /// Keep the canonical audio file after the job terminates instead of
    /// deleting it (`keep_audio` in §3's Lifecycles note).
    #[serde(default)]
    pub keep_audio: bool,
}

/// Process lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Process-level worker pool size (one job per worker, §5).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Graceful shutdown timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

const fn default_min_silence_seconds() -> f64 {
    0.6
}

const fn default_min_length_seconds() -> f64 {
    10.0
}

fn default_concurrency() -> usize {
    num_cpus::get().max(2)
}

const fn default_shutdown_timeout() -> u64 {
    30
}

impl OrchestratorConfig {
    /// Load configuration from an optional `orchestrator.toml`/`config.toml`
    /// layered under `STT_ORCHESTRATOR_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrchestratorError::Configuration`] if a config file
    /// contains invalid syntax or a present field fails to parse.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Like [`Self::load`], but layering an explicit config file on top of
    /// `orchestrator.toml`/`config.toml` if `path` is given.
    ///
    /// # Errors
    ///
    /// Returns [`crate::OrchestratorError::Configuration`] if `path` does not
    /// exist or any config source contains invalid syntax or a field that
    /// fails to parse.
    pub fn load_from(path: Option<&std::path::Path>) -> crate::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("orchestrator").required(false))
            .add_source(config::File::with_name("config").required(false));

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path).required(true),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix("STT_ORCHESTRATOR").separator("_"))
            .build()
            .map_err(|e| crate::OrchestratorError::configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| crate::OrchestratorError::configuration(e.to_string()))
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let scratch_directory = directories::UserDirs::new().map_or_else(
            || std::env::temp_dir().join("stt-orchestrator"),
            |dirs| dirs.home_dir().join(".stt-orchestrator").join("scratch"),
        );

        Self {
            segmentation: SegmentationConfig::default(),
            storage: StorageConfig {
                scratch_directory,
                keep_audio: false,
            },
            service: ServiceConfig {
                concurrency: default_concurrency(),
                shutdown_timeout_seconds: default_shutdown_timeout(),
            },
            known_services: vec![
                QueueAdvertisement {
                    queue: "diarization".to_string(),
                    service_type: ServiceType::Diarization,
                    service_name: "diarization".to_string(),
                },
                QueueAdvertisement {
                    queue: "punctuation".to_string(),
                    service_type: ServiceType::Punctuation,
                    service_name: "punctuation".to_string(),
                },
            ],
        }
    }
}
