//! Error types shared by every orchestrator crate

use std::{error::Error as StdError, fmt};

/// Main error type for core data-model and configuration operations
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Configuration failed to load or validate
    Configuration {
        /// Error message
        message: String,
    },

    /// A requested task could not be resolved to a live queue
    UnresolvableTask {
        /// Name of the task that could not be resolved
        task: String,
    },

    /// Transcoding/segmentation of the input audio failed
    TranscodingFailed {
        /// Error message
        message: String,
    },

    /// A sub-segment transcription call failed
    SubTranscriptionFailed {
        /// Index of the sub-segment that failed
        segment_index: usize,
        /// Error message
        message: String,
    },

    /// Diarization failed
    DiarizationFailed {
        /// Error message
        message: String,
    },

    /// Punctuation restoration failed
    PunctuationFailed {
        /// Error message
        message: String,
    },

    /// Persisting the final result failed
    FinalPersistFailed {
        /// Error message
        message: String,
    },

    /// The result/word cache store could not be reached for an operation
    /// whose failure is fatal (a final result write, or an explicit result
    /// lookup). Cache-read misses on the transcription fast path are *not*
    /// represented by this variant — those are swallowed and treated as a
    /// plain cache miss.
    DatabaseUnreachable {
        /// Error message
        message: String,
    },

    /// The requested job id is unknown to the orchestrator
    UnknownJobId {
        /// The job id that was not found
        job_id: String,
    },

    /// Validation error
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Serialization error
    Serialization(serde_json::Error),

    /// Other error
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::UnresolvableTask { task } => {
                write!(f, "Could not resolve task to a live queue: {task}")
            }
            Self::TranscodingFailed { message } => write!(f, "Transcoding failed: {message}"),
            Self::SubTranscriptionFailed {
                segment_index,
                message,
            } => write!(f, "Sub-segment {segment_index} transcription failed: {message}"),
            Self::DiarizationFailed { message } => write!(f, "Diarization failed: {message}"),
            Self::PunctuationFailed { message } => write!(f, "Punctuation failed: {message}"),
            Self::FinalPersistFailed { message } => {
                write!(f, "Persisting final result failed: {message}")
            }
            Self::DatabaseUnreachable { message } => {
                write!(f, "Result store unreachable: {message}")
            }
            Self::UnknownJobId { job_id } => write!(f, "Unknown job id: {job_id}"),
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::missing_errors_doc, clippy::unnecessary_wraps)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io;

    #[test]
    fn io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_error = Error::from(io_error);
        assert!(matches!(app_error, Error::Io(_)));
        assert!(format!("{app_error}").contains("I/O error"));
    }

    #[test]
    fn unresolvable_task_message() {
        let error = Error::UnresolvableTask {
            task: "diarization".to_string(),
        };
        assert_eq!(
            format!("{error}"),
            "Could not resolve task to a live queue: diarization"
        );
    }

    #[test]
    fn unknown_job_id_message() {
        let error = Error::UnknownJobId {
            job_id: "abc-123".to_string(),
        };
        assert_eq!(format!("{error}"), "Unknown job id: abc-123");
    }

    #[test]
    fn sub_transcription_failed_message() {
        let error = Error::SubTranscriptionFailed {
            segment_index: 3,
            message: "timeout".to_string(),
        };
        assert_eq!(
            format!("{error}"),
            "Sub-segment 3 transcription failed: timeout"
        );
    }

    #[test]
    fn serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_error = Error::from(json_error);
        assert!(matches!(app_error, Error::Serialization(_)));
    }

    #[test]
    fn database_unreachable_message() {
        let error = Error::DatabaseUnreachable {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            format!("{error}"),
            "Result store unreachable: connection refused"
        );
    }

    #[test]
    fn result_type_alias() {
        fn ok() -> Result<i32> {
            Ok(1)
        }
        fn err() -> Result<i32> {
            Err(Error::Other("boom".to_string()))
        }
        assert!(ok().is_ok());
        assert!(err().is_err());
    }
}
