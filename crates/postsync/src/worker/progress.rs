use std::time::Duration;

use crate::remote::RemoteError;

/// Per-post outcomes emitted while a reconciliation pass runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassEvent {
    /// A retryable fetch failure; another attempt follows after `delay`.
    Retry {
        id: i64,
        attempt: u32,
        delay: Duration,
        error: RemoteError,
    },
    /// The post was enriched and persisted.
    Enriched { id: i64 },
    /// The post failed for good and was handed to the reprocessing queue.
    Quarantined { id: i64, message: String },
    /// Persisting an outcome for the post failed.
    StoreWriteFailed { id: i64, message: String },
}

impl PassEvent {
    pub fn id(&self) -> i64 {
        match self {
            PassEvent::Retry { id, .. }
            | PassEvent::Enriched { id }
            | PassEvent::Quarantined { id, .. }
            | PassEvent::StoreWriteFailed { id, .. } => *id,
        }
    }
}

pub trait PassReporter: Send + Sync {
    fn report(&self, event: PassEvent);
}

/// Reporter that drops every event. The pass still logs each outcome.
pub struct NoopReporter;

impl PassReporter for NoopReporter {
    fn report(&self, _event: PassEvent) {}
}
