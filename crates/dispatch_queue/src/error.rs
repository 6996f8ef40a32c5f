//! Dispatch queue error types

use thiserror::Error;

/// Dispatch-specific errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Queue has not been started (or was stopped)
    #[error("dispatch queue is not running")]
    NotRunning,

    /// No queue slot freed up within the wait bound
    #[error("dispatch queue full, event {event_id} dropped after {waited_ms}ms")]
    QueueFull { event_id: u16, waited_ms: u64 },

    /// Private parameter copy could not be allocated
    #[error("failed to allocate {len} byte parameter copy for event {event_id}")]
    AllocationFailed { event_id: u16, len: usize },

    /// start() called from a handler whose own stop() retired the worker
    #[error("dispatch queue cannot restart from its stopped worker")]
    RestartFromStoppedWorker,

    /// Worker thread could not be spawned
    #[error("failed to spawn dispatch worker: {0}")]
    Spawn(#[source] std::io::Error),
}
