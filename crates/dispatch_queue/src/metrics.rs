//! Queue metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a dispatch queue
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Approximate number of queued items
    queue_len: AtomicUsize,
    /// Items accepted into the queue
    dispatched_count: AtomicU64,
    /// Items whose handler has run
    processed_count: AtomicU64,
    /// Items rejected because the queue stayed full
    rejected_count: AtomicU64,
    /// Parameter copies that could not be allocated
    alloc_failure_count: AtomicU64,
    /// Handlers that panicked
    panic_count: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn dispatched_count(&self) -> u64 {
        self.dispatched_count.load(Ordering::Relaxed)
    }

    pub fn inc_dispatched_count(&self) {
        self.dispatched_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed_count(&self) -> u64 {
        self.processed_count.load(Ordering::Relaxed)
    }

    pub fn inc_processed_count(&self) {
        self.processed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn alloc_failure_count(&self) -> u64 {
        self.alloc_failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_alloc_failure_count(&self) {
        self.alloc_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn panic_count(&self) -> u64 {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn inc_panic_count(&self) {
        self.panic_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            queue_len: self.queue_len(),
            dispatched_count: self.dispatched_count(),
            processed_count: self.processed_count(),
            rejected_count: self.rejected_count(),
            alloc_failure_count: self.alloc_failure_count(),
            panic_count: self.panic_count(),
        }
    }
}

/// Snapshot of queue metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetricsSnapshot {
    pub queue_len: usize,
    pub dispatched_count: u64,
    pub processed_count: u64,
    pub rejected_count: u64,
    pub alloc_failure_count: u64,
    pub panic_count: u64,
}
