//! LogSink - logs PCM run summaries via tracing

use contracts::{AudioSink, ContractError};
use tracing::{debug, info, instrument};

/// Sink that logs run summaries for debugging
pub struct LogSink {
    name: String,
    runs: u64,
    bytes: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs: 0,
            bytes: 0,
        }
    }
}

impl AudioSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, pcm: &[u8]) -> Result<usize, ContractError> {
        self.runs += 1;
        self.bytes += pcm.len() as u64;

        debug!(
            sink = %self.name,
            len = pcm.len(),
            run = self.runs,
            total_bytes = self.bytes,
            "PCM run received"
        );
        Ok(pcm.len())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    fn flush(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            runs = self.runs,
            total_bytes = self.bytes,
            "LogSink flushed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_accepts_everything() {
        let mut sink = LogSink::new("test_log");
        assert_eq!(sink.write(&[0; 1440]).unwrap(), 1440);
        assert_eq!(sink.write(&[0; 17]).unwrap(), 17);
        assert!(sink.flush().is_ok());
        assert_eq!(sink.bytes, 1457);
    }

    #[test]
    fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
