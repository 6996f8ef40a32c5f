//! Bridge error types

use audio_stream::StreamError;
use contracts::ContractError;
use dispatch_queue::DispatchError;
use thiserror::Error;

/// Bridge-level errors
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Dispatch subsystem failed to start
    #[error("dispatch subsystem: {0}")]
    Dispatch(#[from] DispatchError),

    /// Audio subsystem failed to start
    #[error("audio subsystem: {0}")]
    Stream(#[from] StreamError),

    /// Sink could not be built from configuration
    #[error("sink error: {0}")]
    Contract(#[from] ContractError),

    /// Mock engine thread could not be spawned
    #[error("failed to spawn mock engine: {0}")]
    Spawn(#[source] std::io::Error),
}
