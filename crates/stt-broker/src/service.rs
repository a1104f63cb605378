//! The remote task client abstraction: a thin, queue-addressed RPC surface
//! the orchestrator uses to dispatch transcription/diarization/punctuation
//! work to out-of-process workers without knowing anything about how those
//! workers are implemented.

use crate::error::BrokerResult;
use crate::types::HandleStatus;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A client capable of dispatching a named task onto a named queue and
/// returning a [`Handle`] to track it.
///
/// Real workers (the actual transcription/diarization/punctuation backends)
/// are treated as opaque peers behind this trait; this crate only speaks the
/// submit/poll/revoke protocol, not any backend-specific wire format.
#[async_trait]
pub trait RemoteTaskClient: Send + Sync {
    /// Submit `task_name` with `args` onto `queue`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BrokerError::UnresolvableTask`] if `queue` has
    /// no live worker, or [`crate::error::BrokerError::QueueFull`] if the
    /// queue is at capacity.
    async fn submit(
        &self,
        task_name: &str,
        queue: &str,
        args: serde_json::Value,
    ) -> BrokerResult<Handle>;
}

/// A live reference to a dispatched task.
///
/// Cloning a `Handle` is not supported; a task has exactly one owner who may
/// wait on it or revoke it.
pub struct Handle {
    pub(crate) id: Uuid,
    pub(crate) status: Arc<Mutex<HandleStatus>>,
    pub(crate) result_rx: async_channel::Receiver<BrokerResult<serde_json::Value>>,
    pub(crate) cancel_tx: async_channel::Sender<()>,
}

impl Handle {
    /// The id assigned to this task at submission time.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle status, as last observed.
    #[must_use]
    pub fn status(&self) -> HandleStatus {
        *self.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Block until the task completes, returning its result.
    ///
    /// `disable_sync_subtasks` mirrors the upstream worker API's flag of the
    /// same name; this in-process implementation has no synchronous
    /// sub-tasks to disable and ignores it, but callers forward it
    /// unconditionally so a future remote implementation can honor it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BrokerError::UnknownHandle`] if the task was
    /// revoked or the worker disappeared before producing a result, or
    /// [`crate::error::BrokerError::TaskFailed`] if the worker reported a
    /// failure.
    pub async fn get(&self, _disable_sync_subtasks: bool) -> BrokerResult<serde_json::Value> {
        match self.result_rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(crate::error::BrokerError::UnknownHandle {
                id: self.id.to_string(),
            }),
        }
    }

    /// Request cancellation.
    ///
    /// Cancellation is cooperative: a task already running to completion in
    /// a worker is not interrupted, only a task still queued is skipped.
    pub async fn revoke(&self) {
        let _ = self.cancel_tx.send(()).await;
        *self.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = HandleStatus::Failure;
    }
}
