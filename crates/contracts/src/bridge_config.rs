//! BridgeConfig - Config Loader output
//!
//! Capacities, wait bounds and sink routing for both subsystems. Defaults
//! match the firmware constants.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BridgeConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Dispatch queue settings
    #[serde(default)]
    #[validate(nested)]
    pub dispatch: DispatchConfig,

    /// Audio ring buffer and writer settings
    #[serde(default)]
    #[validate(nested)]
    pub audio: AudioConfig,

    /// Output sink
    #[serde(default)]
    #[validate(nested)]
    pub sink: SinkConfig,
}

/// Dispatch queue settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchConfig {
    /// Maximum queued work items
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Bounded wait for queue space (milliseconds)
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Worker thread name
    #[serde(default = "default_worker_name")]
    #[validate(length(min = 1))]
    pub worker_name: String,
}

impl DispatchConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            send_timeout_ms: default_send_timeout_ms(),
            worker_name: default_worker_name(),
        }
    }
}

fn default_queue_capacity() -> usize {
    10
}

fn default_send_timeout_ms() -> u64 {
    10
}

fn default_worker_name() -> String {
    "dispatch-worker".to_string()
}

/// Audio ring buffer and writer settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AudioConfig {
    /// Ring buffer capacity in bytes
    #[serde(default = "default_ring_capacity")]
    #[validate(range(min = 1))]
    pub ring_capacity: usize,

    /// Largest chunk accepted by `submit_audio`
    #[serde(default = "default_max_chunk_len")]
    #[validate(range(min = 1))]
    pub max_chunk_len: usize,

    /// Bounded wait for ring space (milliseconds)
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Largest run handed to the sink per write
    #[serde(default = "default_max_run_len")]
    #[validate(range(min = 1))]
    pub max_run_len: usize,

    /// Writer thread name
    #[serde(default = "default_writer_name")]
    #[validate(length(min = 1))]
    pub writer_name: String,

    /// Log a progress line every N received packets (0 = never)
    #[serde(default = "default_packet_log_interval")]
    pub packet_log_interval: u64,
}

impl AudioConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ring_capacity: default_ring_capacity(),
            max_chunk_len: default_max_chunk_len(),
            send_timeout_ms: default_send_timeout_ms(),
            max_run_len: default_max_run_len(),
            writer_name: default_writer_name(),
            packet_log_interval: default_packet_log_interval(),
        }
    }
}

fn default_ring_capacity() -> usize {
    8 * 1024
}

fn default_max_chunk_len() -> usize {
    2048
}

// dma_frame_num * dma_desc_num
fn default_max_run_len() -> usize {
    240 * 6
}

fn default_writer_name() -> String {
    "audio-writer".to_string()
}

fn default_packet_log_interval() -> u64 {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log run summaries
    #[default]
    Log,
    /// Raw PCM file
    File,
    /// Accept and discard
    Null,
}

/// Output sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink name
    #[serde(default = "default_sink_name")]
    #[validate(length(min = 1))]
    pub name: String,

    /// Sink type
    #[serde(default)]
    pub sink_type: SinkType,

    /// Emulated consumption rate in bytes/second (None = as fast as the sink goes)
    #[serde(default)]
    pub paced_byte_rate: Option<u64>,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            name: default_sink_name(),
            sink_type: SinkType::default(),
            paced_byte_rate: None,
            params: HashMap::new(),
        }
    }
}

fn default_sink_name() -> String {
    "pcm_out".to_string()
}
