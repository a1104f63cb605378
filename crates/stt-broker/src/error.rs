//! Error types for the remote task broker.

use thiserror::Error;

/// Result type alias for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur while submitting or tracking a remote task.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The named task/queue has no registered worker.
    #[error("could not resolve task to a live queue: {task}")]
    UnresolvableTask {
        /// Name of the task that could not be resolved.
        task: String,
    },

    /// The broker connection could not be established or was lost.
    #[error("broker unreachable: {message}")]
    Unreachable {
        /// Error message.
        message: String,
    },

    /// The task queue has no capacity left.
    #[error("task queue '{queue}' is full (max: {max_size})")]
    QueueFull {
        /// Queue name.
        queue: String,
        /// Maximum queue size.
        max_size: usize,
    },

    /// A submitted task finished with a worker-reported error.
    #[error("task failed: {message}")]
    TaskFailed {
        /// Error message reported by the worker.
        message: String,
    },

    /// A handle was polled or revoked after the broker had already
    /// discarded it.
    #[error("unknown task handle: {id}")]
    UnknownHandle {
        /// The handle id that was not found.
        id: String,
    },

    /// Serialization of task arguments or results failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<BrokerError> for stt_core::Error {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::UnresolvableTask { task } => Self::UnresolvableTask { task },
            other => Self::Other(other.to_string()),
        }
    }
}
