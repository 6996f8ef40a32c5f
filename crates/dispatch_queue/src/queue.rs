//! DispatchQueue - bounded FIFO of deferred handler invocations

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, SendTimeoutError, Sender};
use tracing::{debug, error, info, instrument, warn};

use contracts::{CopyHook, DispatchConfig, SharedHandler, WorkParam};
use observability::DispatchOutcome;

use crate::error::DispatchError;
use crate::item::WorkItem;
use crate::metrics::QueueMetrics;
use crate::worker;

/// Resources that exist only while the queue is running
struct Running {
    tx: Sender<WorkItem>,
    shutdown_tx: Sender<()>,
    worker: JoinHandle<()>,
}

/// State of a worker left behind by a stop() issued from its own handler
enum StaleWorker {
    Clear,
    Current,
    Busy,
    Finished,
}

const STALE_WORKER_POLL: Duration = Duration::from_millis(1);

/// Deferred-work queue served by one dedicated worker thread
///
/// Handlers run on the worker in enqueue order. Submitters never block for
/// longer than `send_timeout_ms`; when no slot frees up in time the item is
/// dropped together with its parameter.
pub struct DispatchQueue {
    config: DispatchConfig,
    state: Mutex<Option<Running>>,
    /// Emptied only once that thread has finished
    stale_worker: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<QueueMetrics>,
}

impl DispatchQueue {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
            stale_worker: Mutex::new(None),
            metrics: Arc::new(QueueMetrics::new()),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Create the queue and spawn the worker. Calling it again while running
    /// is a no-op.
    ///
    /// If an earlier stop() came from inside a handler, the new worker is not
    /// spawned until that handler has returned and the old worker has exited.
    /// Restarting from that same handler is refused.
    #[instrument(
        name = "dispatch_queue_start",
        skip(self),
        fields(capacity = self.config.queue_capacity, worker = %self.config.worker_name)
    )]
    pub fn start(&self) -> Result<(), DispatchError> {
        let mut state = self.lock_state();
        loop {
            if state.is_some() {
                debug!("Dispatch queue already running");
                return Ok(());
            }
            match self.reap_stale_worker() {
                StaleWorker::Clear => break,
                StaleWorker::Current => {
                    warn!("Dispatch queue restart refused from its stopped worker");
                    return Err(DispatchError::RestartFromStoppedWorker);
                }
                // the old handler may still touch this queue, so wait unlocked
                StaleWorker::Busy | StaleWorker::Finished => {
                    drop(state);
                    thread::sleep(STALE_WORKER_POLL);
                    state = self.lock_state();
                }
            }
        }

        let (tx, rx) = bounded(self.config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = bounded(1);
        let worker = worker::spawn(
            &self.config.worker_name,
            rx,
            shutdown_rx,
            Arc::clone(&self.metrics),
        )
        .map_err(DispatchError::Spawn)?;

        *state = Some(Running {
            tx,
            shutdown_tx,
            worker,
        });
        info!("Dispatch queue started");
        Ok(())
    }

    /// Stop the worker and discard anything still queued. No-op when stopped.
    ///
    /// The worker finishes the handler it is currently running before it
    /// exits. Queued items are dropped, parameters included, without their
    /// handlers being invoked.
    #[instrument(name = "dispatch_queue_stop", skip(self))]
    pub fn stop(&self) {
        // take under the lock, join outside it
        let Some(running) = self.lock_state().take() else {
            self.reap_stale_worker();
            debug!("Dispatch queue not running");
            return;
        };

        let _ = running.shutdown_tx.try_send(());
        drop(running.tx);

        if running.worker.thread().id() == thread::current().id() {
            // stop() issued from inside a handler; the loop exits on return
            warn!("Dispatch queue stopped from its own worker, not joining");
            let previous = self.lock_stale_worker().replace(running.worker);
            // start() only spawned this worker after the previous one finished
            if let Some(previous) = previous {
                join_worker(previous);
            }
        } else {
            join_worker(running.worker);
        }

        self.metrics.set_queue_len(0);
        info!(
            processed = self.metrics.processed_count(),
            rejected = self.metrics.rejected_count(),
            "Dispatch queue stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.lock_state().is_some()
    }

    /// Enqueue an owned parameter for `handler`
    ///
    /// Returns false when the queue is not running or stayed full for the
    /// whole wait bound. On false the parameter has already been dropped.
    pub fn dispatch(
        &self,
        handler: SharedHandler,
        event_id: u16,
        param: Option<WorkParam>,
    ) -> bool {
        self.try_dispatch(handler, event_id, param).is_ok()
    }

    /// Copy `params` into a private buffer and enqueue it for `handler`
    ///
    /// An empty or absent slice enqueues the item with no parameter and no
    /// allocation. `copy_hook` runs once on the fresh copy, after the bytes
    /// are copied in.
    pub fn dispatch_bytes(
        &self,
        handler: SharedHandler,
        event_id: u16,
        params: Option<&[u8]>,
        copy_hook: Option<&CopyHook>,
    ) -> bool {
        self.try_dispatch_bytes(handler, event_id, params, copy_hook)
            .is_ok()
    }

    /// Same as [`dispatch`](Self::dispatch) but reports why admission failed
    pub fn try_dispatch(
        &self,
        handler: SharedHandler,
        event_id: u16,
        param: Option<WorkParam>,
    ) -> Result<(), DispatchError> {
        let tx = self.sender().ok_or_else(|| self.not_running(event_id))?;
        self.send(&tx, WorkItem::dispatch(handler, event_id, param))
    }

    /// Same as [`dispatch_bytes`](Self::dispatch_bytes) but reports why
    /// admission failed
    pub fn try_dispatch_bytes(
        &self,
        handler: SharedHandler,
        event_id: u16,
        params: Option<&[u8]>,
        copy_hook: Option<&CopyHook>,
    ) -> Result<(), DispatchError> {
        let tx = self.sender().ok_or_else(|| self.not_running(event_id))?;

        let param = match params {
            Some(src) if !src.is_empty() => {
                let copy = copy_param(src, copy_hook).map_err(|len| {
                    self.metrics.inc_alloc_failure_count();
                    observability::record_work_dispatch(DispatchOutcome::AllocationFailed);
                    error!(event_id, len, "Failed to allocate work parameter");
                    DispatchError::AllocationFailed { event_id, len }
                })?;
                Some(WorkParam::Bytes(copy))
            }
            _ => None,
        };

        self.send(&tx, WorkItem::dispatch(handler, event_id, param))
    }

    /// Get current metrics
    pub fn metrics(&self) -> &QueueMetrics {
        &self.metrics
    }

    fn send(&self, tx: &Sender<WorkItem>, item: WorkItem) -> Result<(), DispatchError> {
        let event_id = item.event_id;
        let timeout = self.config.send_timeout();

        match tx.send_timeout(item, timeout) {
            Ok(()) => {
                self.metrics.inc_dispatched_count();
                self.metrics.set_queue_len(tx.len());
                observability::record_work_dispatch(DispatchOutcome::Accepted);
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_item)) => {
                self.metrics.inc_rejected_count();
                observability::record_work_dispatch(DispatchOutcome::QueueFull);
                warn!(
                    event_id,
                    waited_ms = self.config.send_timeout_ms,
                    "Dispatch queue full, work dropped"
                );
                Err(DispatchError::QueueFull {
                    event_id,
                    waited_ms: self.config.send_timeout_ms,
                })
            }
            // stop() raced with this send and the worker is gone
            Err(SendTimeoutError::Disconnected(_item)) => Err(self.not_running(event_id)),
        }
    }

    fn sender(&self) -> Option<Sender<WorkItem>> {
        self.lock_state().as_ref().map(|running| running.tx.clone())
    }

    fn not_running(&self, event_id: u16) -> DispatchError {
        observability::record_work_dispatch(DispatchOutcome::NotRunning);
        warn!(event_id, "Dispatch queue not running, work dropped");
        DispatchError::NotRunning
    }

    /// Join the stale worker if it has exited, never blocking on a live one
    fn reap_stale_worker(&self) -> StaleWorker {
        let mut stale = self.lock_stale_worker();
        let status = match stale.as_ref() {
            None => StaleWorker::Clear,
            Some(worker) if worker.thread().id() == thread::current().id() => {
                StaleWorker::Current
            }
            Some(worker) if !worker.is_finished() => StaleWorker::Busy,
            Some(_) => StaleWorker::Finished,
        };
        if let StaleWorker::Finished = status {
            if let Some(worker) = stale.take() {
                join_worker(worker);
            }
            return StaleWorker::Clear;
        }
        status
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<Running>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_stale_worker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.stale_worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DispatchQueue {
    fn drop(&mut self) {
        self.stop();
        let stale = self
            .stale_worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        // dropped from inside the handler that stopped it: nothing to wait for
        if let Some(worker) = stale.filter(|w| w.thread().id() != thread::current().id()) {
            join_worker(worker);
        }
    }
}

fn join_worker(worker: JoinHandle<()>) {
    if let Err(e) = worker.join() {
        error!(error = ?e, "Dispatch worker panicked");
    }
}

/// Copy `src` into an exactly-sized buffer, returning the requested length
/// if the allocation fails
fn copy_param(src: &[u8], copy_hook: Option<&CopyHook>) -> Result<Box<[u8]>, usize> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(src.len()).map_err(|_| src.len())?;
    copy.extend_from_slice(src);
    if let Some(hook) = copy_hook {
        hook(&mut copy, src);
    }
    Ok(copy.into_boxed_slice())
}
