//! Mock protocol engine
//!
//! Drives a [`ProfileRouter`] the way a real wireless stack would: a
//! connection handshake, periodic track metadata, and a paced stream of
//! 16-bit little-endian PCM carrying a sine tone. Used for testing and
//! development without a radio.

use std::f64::consts::TAU;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};
use contracts::{
    A2dpEvent, AudioState, AvrcControllerEvent, AvrcTargetEvent, ConnectionState, PeerAddress,
};
use tracing::{debug, trace};

use crate::router::ProfileRouter;

/// Mock engine configuration
#[derive(Debug, Clone)]
pub struct MockEngineConfig {
    pub peer: PeerAddress,
    pub sample_rate: u32,
    pub channels: u8,
    /// Tone frequency (Hz)
    pub tone_hz: f64,
    /// Peak amplitude in 0.0..=1.0
    pub amplitude: f64,
    /// Bytes per audio packet; rounded down to whole frames
    pub packet_len: usize,
    /// Emit a metadata event this often
    pub metadata_interval: Duration,
    /// Send packets at real-time rate; when false, send as fast as possible
    pub paced: bool,
}

impl Default for MockEngineConfig {
    fn default() -> Self {
        Self {
            peer: [0x02, 0x00, 0x00, 0xA2, 0xD0, 0x01],
            sample_rate: 44_100,
            channels: 2,
            tone_hz: 440.0,
            amplitude: 0.25,
            packet_len: 512,
            metadata_interval: Duration::from_secs(5),
            paced: true,
        }
    }
}

impl MockEngineConfig {
    fn frame_len(&self) -> usize {
        usize::from(self.channels.max(1)) * 2
    }

    fn byte_rate(&self) -> f64 {
        f64::from(self.sample_rate) * self.frame_len() as f64
    }
}

/// Sine tone source producing interleaved 16-bit frames
struct ToneGenerator {
    step: f64,
    phase: f64,
    amplitude: f64,
    channels: usize,
}

impl ToneGenerator {
    fn new(config: &MockEngineConfig) -> Self {
        Self {
            step: TAU * config.tone_hz / f64::from(config.sample_rate.max(1)),
            phase: 0.0,
            amplitude: config.amplitude.clamp(0.0, 1.0),
            channels: usize::from(config.channels.max(1)),
        }
    }

    fn next_packet(&mut self, frames: usize) -> Bytes {
        let mut buf = BytesMut::with_capacity(frames * self.channels * 2);
        for _ in 0..frames {
            let sample = (self.phase.sin() * self.amplitude * f64::from(i16::MAX)) as i16;
            for _ in 0..self.channels {
                buf.put_i16_le(sample);
            }
            self.phase = (self.phase + self.step) % TAU;
        }
        buf.freeze()
    }
}

/// Simulated protocol engine
///
/// Runs in a background thread; `start` while running and `stop` while
/// stopped are no-ops.
pub struct MockProtocolEngine {
    config: MockEngineConfig,
    router: Arc<ProfileRouter>,
    running: Arc<AtomicBool>,
    packets_sent: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockProtocolEngine {
    pub fn new(config: MockEngineConfig, router: Arc<ProfileRouter>) -> Self {
        Self {
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
            packets_sent: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    pub fn start(&self) -> io::Result<()> {
        // Idempotent: if already running, don't start again
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let session = Session {
            config: self.config.clone(),
            router: Arc::clone(&self.router),
            running: Arc::clone(&self.running),
            packets_sent: Arc::clone(&self.packets_sent),
        };

        match thread::Builder::new()
            .name("mock-engine".to_string())
            .spawn(move || session.run())
        {
            Ok(handle) => {
                *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Stop emitting and wait for the engine thread to send its teardown events
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Mock engine thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Audio packets handed to the router
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent.load(Ordering::Relaxed)
    }
}

impl Drop for MockProtocolEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the engine thread
struct Session {
    config: MockEngineConfig,
    router: Arc<ProfileRouter>,
    running: Arc<AtomicBool>,
    packets_sent: Arc<AtomicU64>,
}

impl Session {
    fn run(self) {
        let config = &self.config;
        let peer = config.peer;
        debug!(
            sample_rate = config.sample_rate,
            tone_hz = config.tone_hz,
            "mock engine started"
        );

        self.connect(peer);

        let frame_len = config.frame_len();
        let frames = (config.packet_len / frame_len).max(1);
        let packet_time = Duration::from_secs_f64((frames * frame_len) as f64 / config.byte_rate());

        let mut tone = ToneGenerator::new(config);
        let mut next_send = Instant::now();
        let mut next_metadata = Instant::now();
        let mut track: u32 = 0;

        while self.running.load(Ordering::Relaxed) {
            if Instant::now() >= next_metadata {
                track += 1;
                self.router
                    .on_avrc_controller_event(AvrcControllerEvent::Metadata {
                        attr_id: 1,
                        text: format!("Mock track {track}"),
                    });
                next_metadata += config.metadata_interval;
            }

            let packet = tone.next_packet(frames);
            let admitted = self.router.on_audio_data(&packet);
            let sent = self.packets_sent.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(packet = sent, len = packet.len(), admitted, "mock packet sent");

            if config.paced {
                next_send += packet_time;
                if let Some(wait) = next_send.checked_duration_since(Instant::now()) {
                    thread::sleep(wait);
                }
            } else {
                thread::yield_now();
            }
        }

        self.disconnect(peer);
        debug!(packets = self.packets_sent.load(Ordering::Relaxed), "mock engine stopped");
    }

    fn connect(&self, peer: PeerAddress) {
        let config = &self.config;
        let router = &self.router;

        router.on_a2dp_event(A2dpEvent::ProfileState { initialized: true });
        router.on_a2dp_event(A2dpEvent::ConnectionState {
            peer,
            state: ConnectionState::Connecting,
        });
        router.on_a2dp_event(A2dpEvent::ConnectionState {
            peer,
            state: ConnectionState::Connected,
        });
        router.on_avrc_controller_event(AvrcControllerEvent::ConnectionState {
            peer,
            connected: true,
        });
        router.on_avrc_controller_event(AvrcControllerEvent::GetCapabilitiesResponse {
            capability_count: 3,
            event_mask: 0x0026,
        });
        router.on_avrc_target_event(AvrcTargetEvent::ConnectionState {
            peer,
            connected: true,
        });
        router.on_a2dp_event(A2dpEvent::AudioConfig {
            peer,
            sample_rate: config.sample_rate,
            channels: config.channels,
        });
        router.on_avrc_target_event(AvrcTargetEvent::SetAbsoluteVolume { volume: 64 });
        router.on_a2dp_event(A2dpEvent::AudioState {
            peer,
            state: AudioState::Started,
        });
    }

    fn disconnect(&self, peer: PeerAddress) {
        let router = &self.router;

        router.on_a2dp_event(A2dpEvent::AudioState {
            peer,
            state: AudioState::Suspended,
        });
        router.on_avrc_controller_event(AvrcControllerEvent::ConnectionState {
            peer,
            connected: false,
        });
        router.on_a2dp_event(A2dpEvent::ConnectionState {
            peer,
            state: ConnectionState::Disconnected,
        });
    }
}
