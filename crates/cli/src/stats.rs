//! Run statistics.

use std::time::Duration;

use bridge::BridgeSnapshot;
use observability::{RunningStats, StatsSummary};

/// Statistics from a bridge run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Wall time between engine start and shutdown
    pub duration: Duration,

    /// Audio packets the mock engine produced
    pub packets_sent: u64,

    /// Ring capacity in bytes
    pub ring_capacity: usize,

    /// Counters taken after both subsystems stopped
    pub snapshot: BridgeSnapshot,

    /// Sampled ring occupancy (bytes)
    pub occupancy: StatsSummary,
}

impl RunStats {
    pub fn new(
        duration: Duration,
        packets_sent: u64,
        ring_capacity: usize,
        snapshot: BridgeSnapshot,
        occupancy: &RunningStats,
    ) -> Self {
        Self {
            duration,
            packets_sent,
            ring_capacity,
            snapshot,
            occupancy: occupancy.summary(),
        }
    }

    /// Bytes per second that reached the sink
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.snapshot.audio.written_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Dropped chunks as a percentage of all submitted chunks
    pub fn drop_rate(&self) -> f64 {
        let audio = &self.snapshot.audio;
        let total = audio.admitted_chunks + audio.dropped_chunks;
        if total > 0 {
            (audio.dropped_chunks as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let audio = &self.snapshot.audio;
        let queue = &self.snapshot.queue;

        println!("\n=== Bridge Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Packets sent: {}", self.packets_sent);
        println!("   └─ Throughput: {:.0} B/s", self.throughput());

        println!("\nAudio Stream");
        println!(
            "   ├─ Admitted: {} chunks / {} bytes",
            audio.admitted_chunks, audio.admitted_bytes
        );
        println!(
            "   ├─ Dropped: {} chunks / {} bytes ({:.2}%)",
            audio.dropped_chunks,
            audio.dropped_bytes,
            self.drop_rate()
        );
        println!("   ├─ Rejected: {}", audio.rejected_chunks);
        println!(
            "   ├─ Written: {} bytes in {} runs",
            audio.written_bytes, audio.run_count
        );
        println!(
            "   ├─ Short writes: {}, write errors: {}, sink panics: {}, discarded: {} bytes",
            audio.short_writes, audio.write_errors, audio.sink_panics, audio.discarded_bytes
        );
        println!(
            "   └─ Ring occupancy ({} B): {}",
            self.ring_capacity, self.occupancy
        );

        println!("\nDispatch Queue");
        println!("   ├─ Dispatched: {}", queue.dispatched_count);
        println!("   ├─ Processed: {}", queue.processed_count);
        println!("   ├─ Rejected: {}", queue.rejected_count);
        println!("   ├─ Allocation failures: {}", queue.alloc_failure_count);
        println!("   └─ Handler panics: {}", queue.panic_count);

        println!();
    }
}
