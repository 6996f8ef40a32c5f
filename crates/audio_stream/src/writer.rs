//! Writer thread - drains the ring into the sink

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use contracts::AudioSink;
use tracing::{debug, error, warn};

use crate::metrics::StreamMetrics;
use crate::ring_buffer::RingConsumer;

/// Sink shared between the stream (which keeps it across restarts) and the
/// writer thread (which uses it while running)
pub(crate) type SharedSink = Arc<Mutex<Box<dyn AudioSink>>>;

pub(crate) struct Writer {
    pub consumer: RingConsumer,
    pub sink: SharedSink,
    pub metrics: Arc<StreamMetrics>,
    pub max_run_len: usize,
}

impl Writer {
    pub fn spawn(self, name: &str) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let sink_name = sink.name().to_string();
        debug!(sink = %sink_name, "Audio writer started");

        while let Some(run) = self.consumer.wait_run(self.max_run_len) {
            let len = run.len();
            let metrics = &self.metrics;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                write_run(&mut **sink, &sink_name, run, metrics)
            }));
            // a panicking sink loses the run, never the writer
            let written = outcome.unwrap_or_else(|_| {
                metrics.inc_sink_panics();
                error!(sink = %sink_name, discarded = len, "Sink write panicked, run dropped");
                0
            });
            self.consumer.release(len);

            self.metrics.record_run(written, len - written);
            self.metrics.set_buffered_len(self.consumer.occupied_len());
            observability::record_sink_write(&sink_name, len, written);
        }

        if let Err(e) = sink.flush() {
            error!(sink = %sink_name, error = %e, "Flush failed on shutdown");
        }
        debug!(sink = %sink_name, "Audio writer stopped");
    }
}

/// Offer `run` to the sink until it is fully consumed, the sink stalls, or
/// the sink fails. Returns the number of bytes the sink took.
fn write_run(
    sink: &mut dyn AudioSink,
    sink_name: &str,
    run: &[u8],
    metrics: &StreamMetrics,
) -> usize {
    let mut offset = 0;

    while offset < run.len() {
        let remaining = run.len() - offset;
        match sink.write(&run[offset..]) {
            Ok(0) => {
                warn!(
                    sink = %sink_name,
                    discarded = remaining,
                    "Sink accepted no bytes, abandoning run"
                );
                break;
            }
            Ok(n) => {
                let n = n.min(remaining);
                offset += n;
                if n < remaining {
                    metrics.inc_short_writes();
                    warn!(
                        sink = %sink_name,
                        requested = remaining,
                        written = n,
                        "Short write to sink, re-offering remainder"
                    );
                }
            }
            Err(e) => {
                metrics.inc_write_errors();
                error!(
                    sink = %sink_name,
                    error = %e,
                    discarded = remaining,
                    "Sink write failed, abandoning run"
                );
                break;
            }
        }
    }

    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;

    /// Sink that takes at most `limit` bytes per call and fails on request
    struct StingySink {
        limit: usize,
        fail_after: Option<usize>,
        calls: usize,
        received: Vec<u8>,
    }

    impl AudioSink for StingySink {
        fn name(&self) -> &str {
            "stingy"
        }

        fn write(&mut self, pcm: &[u8]) -> Result<usize, ContractError> {
            self.calls += 1;
            if self.fail_after.is_some_and(|n| self.calls > n) {
                return Err(ContractError::sink_write("stingy", "device gone"));
            }
            let n = pcm.len().min(self.limit);
            self.received.extend_from_slice(&pcm[..n]);
            Ok(n)
        }
    }

    #[test]
    fn test_short_writes_re_offered() {
        let mut sink = StingySink {
            limit: 3,
            fail_after: None,
            calls: 0,
            received: Vec::new(),
        };

        let metrics = StreamMetrics::new();
        let written = write_run(&mut sink, "stingy", &[1, 2, 3, 4, 5, 6, 7], &metrics);
        assert_eq!(written, 7);
        assert_eq!(metrics.short_writes(), 2);
        assert_eq!(sink.calls, 3);
        assert_eq!(sink.received, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_zero_write_abandons_run() {
        let mut sink = StingySink {
            limit: 0,
            fail_after: None,
            calls: 0,
            received: Vec::new(),
        };

        let metrics = StreamMetrics::new();
        assert_eq!(write_run(&mut sink, "stingy", &[1, 2, 3], &metrics), 0);
        assert_eq!(sink.calls, 1);
    }

    #[test]
    fn test_error_abandons_remainder() {
        let mut sink = StingySink {
            limit: 2,
            fail_after: Some(1),
            calls: 0,
            received: Vec::new(),
        };

        let metrics = StreamMetrics::new();
        assert_eq!(write_run(&mut sink, "stingy", &[1, 2, 3, 4, 5], &metrics), 2);
        assert_eq!(sink.received, vec![1, 2]);
        assert_eq!(sink.calls, 2);
        assert_eq!(metrics.write_errors(), 1);
    }
}
