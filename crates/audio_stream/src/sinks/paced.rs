//! PacedSink - emulates a peripheral draining at a fixed byte rate

use std::thread;
use std::time::{Duration, Instant};

use contracts::{AudioSink, ContractError};

/// Wraps a sink and blocks each write until the emulated device would have
/// consumed it
///
/// Deadlines accumulate from the first write, so per-call sleep error does
/// not drift. After an idle gap the schedule restarts from now.
pub struct PacedSink<S> {
    inner: S,
    byte_rate: u64,
    next_free: Option<Instant>,
}

impl<S: AudioSink> PacedSink<S> {
    /// `byte_rate` is bytes per second and must be positive
    pub fn new(inner: S, byte_rate: u64) -> Self {
        Self {
            inner,
            byte_rate: byte_rate.max(1),
            next_free: None,
        }
    }

    fn play_time(&self, len: usize) -> Duration {
        Duration::from_secs_f64(len as f64 / self.byte_rate as f64)
    }
}

impl<S: AudioSink> AudioSink for PacedSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn write(&mut self, pcm: &[u8]) -> Result<usize, ContractError> {
        let written = self.inner.write(pcm)?;

        let now = Instant::now();
        let start = match self.next_free {
            Some(t) if t > now => t,
            _ => now,
        };
        let done = start + self.play_time(written);
        self.next_free = Some(done);

        if let Some(wait) = done.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
        Ok(written)
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        self.inner.flush()
    }
}
