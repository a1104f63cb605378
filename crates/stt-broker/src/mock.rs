//! An in-process [`RemoteTaskClient`] usable in dev mode and in tests,
//! without a real broker connection.
//!
//! Dispatch structure (named queues, bounded channels, one `tokio::spawn`
//! loop per queue) is carried over from the worker pool this crate's
//! predecessor used to drive transcription jobs, generalized from "process
//! one transcription" to "run an arbitrary handler against arbitrary task
//! arguments".

use crate::error::{BrokerError, BrokerResult};
use crate::service::{Handle, RemoteTaskClient};
use crate::types::HandleStatus;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

type HandlerFuture = Pin<Box<dyn Future<Output = BrokerResult<serde_json::Value>> + Send>>;
type TaskHandler = Arc<dyn Fn(serde_json::Value) -> HandlerFuture + Send + Sync>;

struct QueuedTask {
    args: serde_json::Value,
    status: Arc<Mutex<HandleStatus>>,
    result_tx: async_channel::Sender<BrokerResult<serde_json::Value>>,
    cancel_rx: async_channel::Receiver<()>,
}

/// An in-memory broker dispatching submitted tasks to a shared handler via
/// per-queue, bounded-channel worker loops.
pub struct InMemoryBroker {
    queues: Mutex<HashMap<String, async_channel::Sender<QueuedTask>>>,
    handler: TaskHandler,
}

impl InMemoryBroker {
    /// Build a broker that invokes `handler` for every task submitted to any
    /// registered queue.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BrokerResult<serde_json::Value>> + Send + 'static,
    {
        Self {
            queues: Mutex::new(HashMap::new()),
            handler: Arc::new(move |args| Box::pin(handler(args)) as HandlerFuture),
        }
    }

    /// Build a broker whose handler echoes its input back as the result,
    /// useful for exercising submit/get/status plumbing in tests without a
    /// real worker.
    #[must_use]
    pub fn with_echo() -> Self {
        Self::new(|args| async move { Ok(args) })
    }

    /// Register a queue with the given channel capacity and start its
    /// worker loop. Submitting to a queue that was never registered fails
    /// with [`BrokerError::UnresolvableTask`].
    pub fn register_queue(&self, queue: impl Into<String>, capacity: usize) {
        let queue = queue.into();
        let (tx, rx) = async_channel::bounded::<QueuedTask>(capacity.max(1));
        let handler = Arc::clone(&self.handler);
        let queue_name = queue.clone();
        tokio::spawn(run_queue(queue_name, rx, handler));
        self.queues.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(queue, tx);
    }
}

/// Drain `rx`, running `handler` against each task that was not revoked
/// before the worker got to it. Exits once `rx` is closed and drained.
async fn run_queue(
    queue_name: String,
    rx: async_channel::Receiver<QueuedTask>,
    handler: TaskHandler,
) {
    debug!(queue = %queue_name, "broker queue worker started");
    while let Ok(task) = rx.recv().await {
        if task.cancel_rx.try_recv().is_ok() {
            debug!(queue = %queue_name, "task revoked before start, skipping");
            continue;
        }
        *task.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            HandleStatus::Started;
        let outcome = handler(task.args).await;
        *task.status.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = match &outcome {
            Ok(_) => HandleStatus::Success,
            Err(_) => HandleStatus::Failure,
        };
        if task.result_tx.send(outcome).await.is_err() {
            warn!(queue = %queue_name, "result receiver dropped before task completed");
        }
    }
    debug!(queue = %queue_name, "broker queue worker shutting down");
}

#[async_trait]
impl RemoteTaskClient for InMemoryBroker {
    async fn submit(
        &self,
        task_name: &str,
        queue: &str,
        args: serde_json::Value,
    ) -> BrokerResult<Handle> {
        let sender = self
            .queues
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(queue)
            .cloned();
        let Some(sender) = sender else {
            return Err(BrokerError::UnresolvableTask {
                task: task_name.to_string(),
            });
        };

        let id = Uuid::new_v4();
        let status = Arc::new(Mutex::new(HandleStatus::Pending));
        let (result_tx, result_rx) = async_channel::bounded(1);
        let (cancel_tx, cancel_rx) = async_channel::bounded(1);

        let task = QueuedTask {
            args,
            status: Arc::clone(&status),
            result_tx,
            cancel_rx,
        };

        let max_size = sender.capacity().unwrap_or(0);
        sender
            .try_send(task)
            .map_err(|_| BrokerError::QueueFull {
                queue: queue.to_string(),
                max_size,
            })?;
        *status.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = HandleStatus::Sent;

        Ok(Handle {
            id,
            status,
            result_rx,
            cancel_tx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_full_is_reported() {
        // Capacity 1 means at most one task can sit buffered while the
        // worker is busy with another; a single worker loop can have at
        // most one task in flight, so a third submission must always be
        // rejected regardless of scheduling order.
        let broker = InMemoryBroker::new(|_| async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(serde_json::json!(null))
        });
        broker.register_queue("slow", 1);

        let _first = broker
            .submit("task", "slow", serde_json::json!({}))
            .await
            .unwrap();
        let _second = broker
            .submit("task", "slow", serde_json::json!({}))
            .await
            .unwrap();
        let third = broker.submit("task", "slow", serde_json::json!({})).await;
        assert!(matches!(third, Err(BrokerError::QueueFull { .. })));
    }

    #[tokio::test]
    async fn revoke_before_start_prevents_handler_invocation() {
        // Drives `run_queue` directly, rather than through a spawned task,
        // so the revoke is guaranteed to land before the queue is ever
        // polled -- `submit` + `Handle::revoke` racing against a real
        // worker loop cannot make that ordering guarantee.
        use std::sync::atomic::{AtomicBool, Ordering};

        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = Arc::clone(&ran);
        let handler: TaskHandler = Arc::new(move |_| {
            let ran = Arc::clone(&ran_clone);
            Box::pin(async move {
                ran.store(true, Ordering::SeqCst);
                Ok(serde_json::json!("ran"))
            })
        });

        let (tx, rx) = async_channel::bounded::<QueuedTask>(4);
        let status = Arc::new(Mutex::new(HandleStatus::Pending));
        let (result_tx, _result_rx) = async_channel::bounded(1);
        let (cancel_tx, cancel_rx) = async_channel::bounded(1);

        cancel_tx.send(()).await.unwrap();
        tx.try_send(QueuedTask {
            args: serde_json::json!({}),
            status: Arc::clone(&status),
            result_tx,
            cancel_rx,
        })
        .unwrap();
        drop(tx);

        run_queue("test".to_string(), rx, handler).await;

        assert!(!ran.load(Ordering::SeqCst));
        // The skip path leaves status untouched; a caller that revoked
        // already observed `Failure` synchronously via `Handle::revoke`.
        assert_eq!(*status.lock().unwrap(), HandleStatus::Pending);
    }

    #[tokio::test]
    async fn failing_handler_surfaces_as_failure_status() {
        let broker = InMemoryBroker::new(|_| async {
            Err(BrokerError::TaskFailed {
                message: "boom".to_string(),
            })
        });
        broker.register_queue("failing", 4);
        let handle = broker
            .submit("task", "failing", serde_json::json!({}))
            .await
            .unwrap();
        let result = handle.get(false).await;
        assert!(result.is_err());
        assert_eq!(handle.status(), HandleStatus::Failure);
    }
}
