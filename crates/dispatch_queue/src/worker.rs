//! Worker thread that drains the queue and runs handlers in order

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{select_biased, Receiver};
use tracing::{debug, error, trace};

use crate::item::{Signal, WorkItem};
use crate::metrics::QueueMetrics;

/// Spawn the dedicated worker thread
pub(crate) fn spawn(
    name: &str,
    rx: Receiver<WorkItem>,
    shutdown_rx: Receiver<()>,
    metrics: Arc<QueueMetrics>,
) -> io::Result<JoinHandle<()>> {
    let worker_name = name.to_string();
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || worker_loop(&worker_name, rx, shutdown_rx, &metrics))
}

fn worker_loop(
    name: &str,
    rx: Receiver<WorkItem>,
    shutdown_rx: Receiver<()>,
    metrics: &QueueMetrics,
) {
    debug!(worker = %name, "Dispatch worker started");

    loop {
        // shutdown wins over pending work
        select_biased! {
            recv(shutdown_rx) -> _ => break,
            recv(rx) -> msg => match msg {
                Ok(item) => {
                    metrics.set_queue_len(rx.len());
                    process(item, metrics);
                }
                // every sender is gone
                Err(_) => break,
            },
        }
    }

    debug!(worker = %name, "Dispatch worker stopped");
}

/// Run one item, then release its parameter
fn process(item: WorkItem, metrics: &QueueMetrics) {
    let WorkItem {
        signal,
        event_id,
        handler,
        param,
        enqueued_at,
    } = item;
    let queue_latency = enqueued_at.elapsed();

    let panicked = match signal {
        Signal::DispatchWork => {
            trace!(event_id, "Dispatching work");
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event_id, param.as_ref())));
            if outcome.is_err() {
                metrics.inc_panic_count();
                error!(event_id, "Work handler panicked");
            }
            outcome.is_err()
        }
    };

    drop(param);
    metrics.inc_processed_count();
    observability::record_work_processed(queue_latency, panicked);
}
