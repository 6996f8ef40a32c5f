//! # Audio Stream
//!
//! 音频字节流模块。
//!
//! 负责：
//! - 有界字节环形缓冲区，整块准入或整块丢弃
//! - 专用 writer 线程按序将字节写入 sink
//! - 内置 sink 实现 (Log / File / Null / Memory / Paced)

pub mod error;
pub mod metrics;
pub mod ring_buffer;
pub mod sinks;
pub mod stream;
mod writer;

pub use contracts::{AudioConfig, AudioSink};
pub use error::{StreamError, SubmitError};
pub use metrics::{StreamMetrics, StreamMetricsSnapshot};
pub use ring_buffer::{byte_ring, RingConsumer, RingProducer};
pub use sinks::{create_sink, FileSink, LogSink, MemorySink, NullSink, PacedSink};
pub use stream::AudioStream;
