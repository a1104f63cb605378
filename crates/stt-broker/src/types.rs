//! Handle and status types returned by the remote task client.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a dispatched task, as observed through the broker.
///
/// `Pending` and `Sent` are deliberately distinct: `Pending` means the task
/// has not yet been picked up off the queue by any worker, while `Sent` means
/// the broker has handed it to a worker but has not yet observed a `Started`
/// acknowledgement. A caller polling `Handle::status` sees `Sent` briefly
/// even for tasks that complete almost immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleStatus {
    /// Queued, not yet claimed by a worker.
    Pending,
    /// Claimed by a worker but not yet acknowledged as started.
    Sent,
    /// Acknowledged as started by the worker.
    Started,
    /// Completed successfully.
    Success,
    /// Completed with an error.
    Failure,
}

impl HandleStatus {
    /// Whether this status represents a terminal state (no further
    /// transitions expected).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}
