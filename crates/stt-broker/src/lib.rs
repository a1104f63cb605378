//! Remote task client abstraction for dispatching work to out-of-process
//! transcription, diarization and punctuation workers.
//!
//! Real workers are treated as opaque queue-addressed RPC peers; this crate
//! only speaks the submit/poll/revoke protocol in [`service::RemoteTaskClient`].

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod mock;
pub mod service;
pub mod types;

pub use error::{BrokerError, BrokerResult};
pub use mock::InMemoryBroker;
pub use service::{Handle, RemoteTaskClient};
pub use types::HandleStatus;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_broker_implements_remote_task_client() {
        let broker = InMemoryBroker::with_echo();
        broker.register_queue("q", 4);
        let handle: Handle = broker.submit("t", "q", serde_json::json!(1)).await.unwrap();
        assert_eq!(handle.get(false).await.unwrap(), serde_json::json!(1));
    }
}
