//! ProfileRouter - protocol-engine-facing callbacks

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use audio_stream::AudioStream;
use contracts::{
    A2dpEvent, AvrcControllerEvent, AvrcTargetEvent, ProfileEvent, SharedHandler, WorkParam,
};
use dispatch_queue::DispatchQueue;
use tracing::{error, info};

use crate::handlers::LoggingHandler;

/// One handler per profile
#[derive(Clone)]
pub struct ProfileHandlers {
    pub a2dp: SharedHandler,
    pub avrc_controller: SharedHandler,
    pub avrc_target: SharedHandler,
}

impl ProfileHandlers {
    /// Same handler for every profile
    pub fn uniform(handler: SharedHandler) -> Self {
        Self {
            a2dp: Arc::clone(&handler),
            avrc_controller: Arc::clone(&handler),
            avrc_target: handler,
        }
    }
}

impl Default for ProfileHandlers {
    fn default() -> Self {
        Self {
            a2dp: Arc::new(LoggingHandler::new("a2dp")),
            avrc_controller: Arc::new(LoggingHandler::new("avrc_ct")),
            avrc_target: Arc::new(LoggingHandler::new("avrc_tg")),
        }
    }
}

/// Callback surface the protocol engine invokes
///
/// Every method is safe to call from the engine's own context: audio is
/// admitted or dropped within the stream's wait bound, and events are handed
/// to the dispatch worker within the queue's wait bound.
pub struct ProfileRouter {
    dispatch: Arc<DispatchQueue>,
    audio: Arc<AudioStream>,
    handlers: ProfileHandlers,
    packet_count: AtomicU64,
    packet_log_interval: u64,
}

impl ProfileRouter {
    pub fn new(
        dispatch: Arc<DispatchQueue>,
        audio: Arc<AudioStream>,
        handlers: ProfileHandlers,
        packet_log_interval: u64,
    ) -> Self {
        Self {
            dispatch,
            audio,
            handlers,
            packet_count: AtomicU64::new(0),
            packet_log_interval,
        }
    }

    /// Incoming audio packet
    ///
    /// Empty and oversized packets are ignored without counting. Returns the
    /// number of bytes admitted (0 or the packet length).
    pub fn on_audio_data(&self, data: &[u8]) -> usize {
        if data.is_empty() || data.len() > self.audio.config().max_chunk_len {
            return 0;
        }

        let admitted = self.audio.submit_audio(data);

        let count = self.packet_count.fetch_add(1, Ordering::Relaxed) + 1;
        if self.packet_log_interval > 0 && count.is_multiple_of(self.packet_log_interval) {
            info!(packets = count, "Audio packet count");
        }
        admitted
    }

    /// Returns true if the event was handed to the a2dp handler
    pub fn on_a2dp_event(&self, event: A2dpEvent) -> bool {
        let supported = event.is_supported();
        self.route(supported, ProfileEvent::A2dp(event), &self.handlers.a2dp)
    }

    /// Returns true if the event was handed to the controller handler
    pub fn on_avrc_controller_event(&self, event: AvrcControllerEvent) -> bool {
        let supported = event.is_supported();
        self.route(
            supported,
            ProfileEvent::AvrcController(event),
            &self.handlers.avrc_controller,
        )
    }

    /// Returns true if the event was handed to the target handler
    pub fn on_avrc_target_event(&self, event: AvrcTargetEvent) -> bool {
        let supported = event.is_supported();
        self.route(
            supported,
            ProfileEvent::AvrcTarget(event),
            &self.handlers.avrc_target,
        )
    }

    /// Audio packets seen so far, admitted or not
    pub fn packet_count(&self) -> u64 {
        self.packet_count.load(Ordering::Relaxed)
    }

    fn route(&self, supported: bool, event: ProfileEvent, handler: &SharedHandler) -> bool {
        let profile = event.profile();
        let code = event.code();
        if !supported {
            error!(profile, event_id = code, "Invalid profile event");
            return false;
        }

        self.dispatch
            .dispatch(Arc::clone(handler), code, Some(WorkParam::Profile(event)))
    }
}
