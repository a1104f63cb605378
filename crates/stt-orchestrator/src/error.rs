//! Error types for the job orchestrator.

use std::{error::Error as StdError, fmt, path::PathBuf};

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors that can occur while orchestrating a transcription job.
#[derive(Debug)]
pub enum OrchestratorError {
    /// A core data-model, config or cache operation failed.
    Core(stt_core::Error),

    /// A remote task submission or wait failed.
    Broker(stt_broker::BrokerError),

    /// Audio transcoding produced no output file.
    Transcoding {
        /// Path of the input file that failed to transcode.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// I/O error.
    Io(std::io::Error),

    /// Configuration failed to load or validate.
    Configuration {
        /// Error message.
        message: String,
    },

    /// The orchestrator service was asked to stop while not running.
    ServiceNotRunning,

    /// The orchestrator service was asked to start while already running.
    ServiceAlreadyRunning,

    /// Graceful shutdown did not complete cleanly.
    Shutdown {
        /// Error message.
        message: String,
    },
}

impl OrchestratorError {
    /// Create a new transcoding error.
    #[must_use]
    pub fn transcoding<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Transcoding {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new shutdown error.
    #[must_use]
    pub fn shutdown<S: Into<String>>(message: S) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(err) => write!(f, "{err}"),
            Self::Broker(err) => write!(f, "{err}"),
            Self::Transcoding { path, message } => {
                write!(f, "Transcoding failed for {}: {message}", path.display())
            }
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::ServiceNotRunning => write!(f, "Orchestrator service is not running"),
            Self::ServiceAlreadyRunning => write!(f, "Orchestrator service is already running"),
            Self::Shutdown { message } => write!(f, "Shutdown error: {message}"),
        }
    }
}

impl StdError for OrchestratorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            Self::Broker(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<stt_core::Error> for OrchestratorError {
    fn from(err: stt_core::Error) -> Self {
        Self::Core(err)
    }
}

impl From<stt_broker::BrokerError> for OrchestratorError {
    fn from(err: stt_broker::BrokerError) -> Self {
        Self::Broker(err)
    }
}

impl From<std::io::Error> for OrchestratorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Project an [`OrchestratorError`] onto the shared [`stt_core::Error`] taxonomy,
/// annotating the failing step the way `JobRecord::fail` expects.
impl From<OrchestratorError> for stt_core::Error {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Core(err) => err,
            OrchestratorError::Broker(err) => err.into(),
            OrchestratorError::Transcoding { path, message } => Self::TranscodingFailed {
                message: format!("{}: {message}", path.display()),
            },
            other => Self::Other(other.to_string()),
        }
    }
}
