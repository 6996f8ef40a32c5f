//! Work item carried through the queue

use std::fmt;
use std::time::Instant;

use contracts::{SharedHandler, WorkParam};

/// Signal to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Signal {
    /// Invoke the item's handler
    DispatchWork,
}

/// One deferred handler invocation
///
/// The queue slot owns the item until it is received; the worker owns it
/// until the handler returns, then drops `param`.
pub struct WorkItem {
    pub signal: Signal,
    pub event_id: u16,
    pub handler: SharedHandler,
    pub param: Option<WorkParam>,
    pub enqueued_at: Instant,
}

impl WorkItem {
    pub fn dispatch(handler: SharedHandler, event_id: u16, param: Option<WorkParam>) -> Self {
        Self {
            signal: Signal::DispatchWork,
            event_id,
            handler,
            param,
            enqueued_at: Instant::now(),
        }
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("signal", &self.signal)
            .field("event_id", &self.event_id)
            .field("param", &self.param)
            .finish_non_exhaustive()
    }
}
