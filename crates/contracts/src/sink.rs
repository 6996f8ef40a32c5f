//! AudioSink trait - writer thread output interface
//!
//! Defines the abstract interface for the audio output peripheral.

use crate::ContractError;

/// Raw PCM output trait
///
/// The writer thread owns the sink while the audio stream is running and
/// issues one blocking `write` per drained run. Pacing is the sink's own
/// business (DMA, internal buffering, sleeping).
pub trait AudioSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write raw PCM bytes
    ///
    /// Returns how many bytes the sink actually consumed, which may be fewer
    /// than `pcm.len()`.
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn write(&mut self, pcm: &[u8]) -> Result<usize, ContractError>;

    /// Flush buffered output (if any)
    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&mut self, pcm: &[u8]) -> Result<usize, ContractError> {
        (**self).write(pcm)
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        (**self).flush()
    }
}
