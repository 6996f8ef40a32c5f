//! Audio stream metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for one audio stream
#[derive(Debug, Default)]
pub struct StreamMetrics {
    /// Unread bytes in the ring, sampled after each admission and run
    buffered_len: AtomicUsize,
    admitted_chunks: AtomicU64,
    admitted_bytes: AtomicU64,
    /// Chunks dropped because the ring stayed full
    dropped_chunks: AtomicU64,
    dropped_bytes: AtomicU64,
    /// Chunks rejected as empty or oversized
    rejected_chunks: AtomicU64,
    /// Bytes the sink reported as consumed
    written_bytes: AtomicU64,
    /// Runs handed to the sink
    run_count: AtomicU64,
    /// Sink writes that consumed less than offered
    short_writes: AtomicU64,
    /// Sink writes that returned an error
    write_errors: AtomicU64,
    /// Bytes abandoned after a zero-length or failed write
    discarded_bytes: AtomicU64,
    /// Sink writes that panicked
    sink_panics: AtomicU64,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffered_len.load(Ordering::Relaxed)
    }

    pub fn set_buffered_len(&self, len: usize) {
        self.buffered_len.store(len, Ordering::Relaxed);
    }

    pub fn admitted_chunks(&self) -> u64 {
        self.admitted_chunks.load(Ordering::Relaxed)
    }

    pub fn admitted_bytes(&self) -> u64 {
        self.admitted_bytes.load(Ordering::Relaxed)
    }

    pub fn record_admitted(&self, len: usize) {
        self.admitted_chunks.fetch_add(1, Ordering::Relaxed);
        self.admitted_bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn dropped_chunks(&self) -> u64 {
        self.dropped_chunks.load(Ordering::Relaxed)
    }

    pub fn dropped_bytes(&self) -> u64 {
        self.dropped_bytes.load(Ordering::Relaxed)
    }

    pub fn record_dropped(&self, len: usize) {
        self.dropped_chunks.fetch_add(1, Ordering::Relaxed);
        self.dropped_bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn rejected_chunks(&self) -> u64 {
        self.rejected_chunks.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_chunks(&self) {
        self.rejected_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn written_bytes(&self) -> u64 {
        self.written_bytes.load(Ordering::Relaxed)
    }

    pub fn run_count(&self) -> u64 {
        self.run_count.load(Ordering::Relaxed)
    }

    pub fn record_run(&self, written: usize, discarded: usize) {
        self.run_count.fetch_add(1, Ordering::Relaxed);
        self.written_bytes.fetch_add(written as u64, Ordering::Relaxed);
        self.discarded_bytes
            .fetch_add(discarded as u64, Ordering::Relaxed);
    }

    pub fn short_writes(&self) -> u64 {
        self.short_writes.load(Ordering::Relaxed)
    }

    pub fn inc_short_writes(&self) {
        self.short_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    pub fn inc_write_errors(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes.load(Ordering::Relaxed)
    }

    pub fn sink_panics(&self) -> u64 {
        self.sink_panics.load(Ordering::Relaxed)
    }

    pub fn inc_sink_panics(&self) {
        self.sink_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> StreamMetricsSnapshot {
        StreamMetricsSnapshot {
            buffered_len: self.buffered_len(),
            admitted_chunks: self.admitted_chunks(),
            admitted_bytes: self.admitted_bytes(),
            dropped_chunks: self.dropped_chunks(),
            dropped_bytes: self.dropped_bytes(),
            rejected_chunks: self.rejected_chunks(),
            written_bytes: self.written_bytes(),
            run_count: self.run_count(),
            short_writes: self.short_writes(),
            write_errors: self.write_errors(),
            discarded_bytes: self.discarded_bytes(),
            sink_panics: self.sink_panics(),
        }
    }
}

/// Snapshot of stream metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamMetricsSnapshot {
    pub buffered_len: usize,
    pub admitted_chunks: u64,
    pub admitted_bytes: u64,
    pub dropped_chunks: u64,
    pub dropped_bytes: u64,
    pub rejected_chunks: u64,
    pub written_bytes: u64,
    pub run_count: u64,
    pub short_writes: u64,
    pub write_errors: u64,
    pub discarded_bytes: u64,
    pub sink_panics: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = StreamMetrics::new();
        metrics.record_admitted(512);
        metrics.record_admitted(256);
        metrics.record_dropped(2048);
        metrics.record_run(700, 68);
        metrics.inc_short_writes();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.admitted_chunks, 2);
        assert_eq!(snapshot.admitted_bytes, 768);
        assert_eq!(snapshot.dropped_bytes, 2048);
        assert_eq!(snapshot.written_bytes, 700);
        assert_eq!(snapshot.discarded_bytes, 68);
        assert_eq!(snapshot.short_writes, 1);
        assert_eq!(snapshot.write_errors, 0);
    }
}
