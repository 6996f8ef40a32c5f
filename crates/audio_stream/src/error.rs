//! Audio stream error types

use thiserror::Error;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum StreamError {
    /// Configuration cannot produce a working ring/writer
    #[error("invalid audio config field '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// Writer thread could not be spawned
    #[error("failed to spawn audio writer: {0}")]
    Spawn(#[source] std::io::Error),
}

impl StreamError {
    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why a chunk was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Stream has not been started (or was stopped)
    #[error("audio stream is not running")]
    NotRunning,

    #[error("empty audio chunk")]
    EmptyChunk,

    /// Chunk exceeds the per-call bound; never truncated
    #[error("audio chunk of {len} bytes exceeds limit of {max}")]
    Oversized { len: usize, max: usize },

    /// Not enough ring space within the wait bound; whole chunk dropped
    #[error("ring buffer full, {len} byte chunk dropped")]
    BufferFull { len: usize },
}
