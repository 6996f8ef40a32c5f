//! Default profile event handlers

use contracts::{WorkHandler, WorkParam};
use tracing::{info, warn};

/// Handler that logs every event it receives
pub struct LoggingHandler {
    profile: &'static str,
}

impl LoggingHandler {
    pub fn new(profile: &'static str) -> Self {
        Self { profile }
    }
}

impl WorkHandler for LoggingHandler {
    fn handle(&self, event_id: u16, param: Option<&WorkParam>) {
        match param.and_then(WorkParam::as_profile) {
            Some(event) => info!(
                profile = self.profile,
                event_id,
                event = ?event,
                "Profile event handled"
            ),
            None => warn!(
                profile = self.profile,
                event_id,
                param = ?param,
                "Profile event without typed payload"
            ),
        }
    }
}
