//! Bridge - lifecycle object owning both subsystems

use std::sync::Arc;

use audio_stream::{create_sink, AudioStream, StreamMetricsSnapshot};
use contracts::{AudioSink, BridgeConfig};
use dispatch_queue::{DispatchQueue, QueueMetricsSnapshot};
use tracing::{info, instrument};

use crate::error::BridgeError;
use crate::router::{ProfileHandlers, ProfileRouter};

/// Owns one dispatch queue and one audio stream
///
/// The two subsystems are independent; each pair of start/stop operations
/// is idempotent on its own.
pub struct Bridge {
    dispatch: Arc<DispatchQueue>,
    audio: Arc<AudioStream>,
    packet_log_interval: u64,
}

/// Point-in-time view of both subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSnapshot {
    pub dispatch_running: bool,
    pub audio_running: bool,
    pub queue: QueueMetricsSnapshot,
    pub audio: StreamMetricsSnapshot,
}

impl Bridge {
    /// Create a bridge writing audio into `sink`
    pub fn new(config: &BridgeConfig, sink: Box<dyn AudioSink>) -> Self {
        Self {
            dispatch: Arc::new(DispatchQueue::new(config.dispatch.clone())),
            audio: Arc::new(AudioStream::new(config.audio.clone(), sink)),
            packet_log_interval: config.audio.packet_log_interval,
        }
    }

    /// Create a bridge with the sink described in `config.sink`
    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let sink = create_sink(&config.sink)?;
        Ok(Self::new(config, sink))
    }

    pub fn start_dispatch_subsystem(&self) -> Result<(), BridgeError> {
        self.dispatch.start()?;
        Ok(())
    }

    pub fn stop_dispatch_subsystem(&self) {
        self.dispatch.stop();
    }

    pub fn start_audio_subsystem(&self) -> Result<(), BridgeError> {
        self.audio.start()?;
        Ok(())
    }

    pub fn stop_audio_subsystem(&self) {
        self.audio.stop();
    }

    /// Start dispatch, then audio. If audio fails, dispatch is stopped again.
    #[instrument(name = "bridge_start", skip(self))]
    pub fn start(&self) -> Result<(), BridgeError> {
        self.start_dispatch_subsystem()?;
        if let Err(e) = self.start_audio_subsystem() {
            self.stop_dispatch_subsystem();
            return Err(e);
        }
        info!(sink = %self.audio.sink_name(), "Bridge started");
        Ok(())
    }

    /// Stop audio, then dispatch
    #[instrument(name = "bridge_stop", skip(self))]
    pub fn stop(&self) {
        self.stop_audio_subsystem();
        self.stop_dispatch_subsystem();
        info!("Bridge stopped");
    }

    /// Engine-facing callback surface routed through this bridge
    pub fn router(&self, handlers: ProfileHandlers) -> ProfileRouter {
        ProfileRouter::new(
            Arc::clone(&self.dispatch),
            Arc::clone(&self.audio),
            handlers,
            self.packet_log_interval,
        )
    }

    pub fn dispatch_queue(&self) -> &Arc<DispatchQueue> {
        &self.dispatch
    }

    pub fn audio_stream(&self) -> &Arc<AudioStream> {
        &self.audio
    }

    pub fn snapshot(&self) -> BridgeSnapshot {
        BridgeSnapshot {
            dispatch_running: self.dispatch.is_running(),
            audio_running: self.audio.is_running(),
            queue: self.dispatch.metrics().snapshot(),
            audio: self.audio.metrics().snapshot(),
        }
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.stop_audio_subsystem();
        self.stop_dispatch_subsystem();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_stream::MemorySink;
    use contracts::{AudioConfig, SinkConfig, SinkType};

    #[test]
    fn test_subsystems_independent() {
        let bridge = Bridge::new(&BridgeConfig::default(), Box::new(MemorySink::new("mem")));

        bridge.start_audio_subsystem().unwrap();
        let snapshot = bridge.snapshot();
        assert!(snapshot.audio_running);
        assert!(!snapshot.dispatch_running);

        bridge.start_dispatch_subsystem().unwrap();
        bridge.stop_audio_subsystem();
        let snapshot = bridge.snapshot();
        assert!(!snapshot.audio_running);
        assert!(snapshot.dispatch_running);

        bridge.stop();
        bridge.stop();
        let snapshot = bridge.snapshot();
        assert!(!snapshot.audio_running);
        assert!(!snapshot.dispatch_running);
    }

    #[test]
    fn test_start_rolls_back_dispatch_on_audio_failure() {
        let config = BridgeConfig {
            audio: AudioConfig {
                ring_capacity: 1024,
                max_chunk_len: 2048,
                ..AudioConfig::default()
            },
            ..BridgeConfig::default()
        };
        let bridge = Bridge::new(&config, Box::new(MemorySink::new("mem")));

        assert!(matches!(bridge.start(), Err(BridgeError::Stream(_))));
        assert!(!bridge.dispatch_queue().is_running());
    }

    #[test]
    fn test_from_config_builds_sink() {
        let config = BridgeConfig {
            sink: SinkConfig {
                name: "discard".to_string(),
                sink_type: SinkType::Null,
                ..SinkConfig::default()
            },
            ..BridgeConfig::default()
        };
        let bridge = Bridge::from_config(&config).unwrap();
        assert_eq!(bridge.audio_stream().sink_name(), "discard");

        let broken = BridgeConfig {
            sink: SinkConfig {
                sink_type: SinkType::File,
                ..SinkConfig::default()
            },
            ..BridgeConfig::default()
        };
        assert!(matches!(
            Bridge::from_config(&broken),
            Err(BridgeError::Contract(_))
        ));
    }
}
