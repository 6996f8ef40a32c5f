//! AudioStream - ring buffer admission plus the writer thread lifecycle

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use contracts::{AudioConfig, AudioSink};
use observability::ChunkOutcome;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{StreamError, SubmitError};
use crate::metrics::StreamMetrics;
use crate::ring_buffer::{byte_ring, RingProducer};
use crate::writer::{SharedSink, Writer};

/// Resources that exist only while the stream is running
struct Running {
    producer: Arc<RingProducer>,
    writer: JoinHandle<()>,
}

/// Byte stream from bursty producers to a blocking sink
///
/// Producers call [`submit_audio`](Self::submit_audio) from contexts that
/// must not stall; each chunk is admitted whole within `send_timeout_ms` or
/// dropped whole. A dedicated writer thread forwards admitted bytes to the
/// sink in order.
pub struct AudioStream {
    config: AudioConfig,
    sink_name: String,
    sink: SharedSink,
    state: Mutex<Option<Running>>,
    metrics: Arc<StreamMetrics>,
}

impl AudioStream {
    pub fn new(config: AudioConfig, sink: Box<dyn AudioSink>) -> Self {
        Self {
            config,
            sink_name: sink.name().to_string(),
            sink: Arc::new(Mutex::new(sink)),
            state: Mutex::new(None),
            metrics: Arc::new(StreamMetrics::new()),
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    /// Create the ring and spawn the writer. Calling it again while running
    /// is a no-op.
    #[instrument(
        name = "audio_stream_start",
        skip(self),
        fields(
            ring_capacity = self.config.ring_capacity,
            sink = %self.sink_name
        )
    )]
    pub fn start(&self) -> Result<(), StreamError> {
        let mut state = self.lock_state();
        if state.is_some() {
            debug!("Audio stream already running");
            return Ok(());
        }
        self.check_config()?;

        let (producer, consumer) = byte_ring(self.config.ring_capacity);
        let writer = Writer {
            consumer,
            sink: Arc::clone(&self.sink),
            metrics: Arc::clone(&self.metrics),
            max_run_len: self.config.max_run_len,
        }
        .spawn(&self.config.writer_name)
        .map_err(StreamError::Spawn)?;

        *state = Some(Running {
            producer: Arc::new(producer),
            writer,
        });
        self.metrics.set_buffered_len(0);
        info!("Audio stream started");
        Ok(())
    }

    /// Close the ring, wait for the writer to exit and drop the ring.
    /// No-op when stopped.
    ///
    /// Bytes still buffered are discarded. A sink write already in progress
    /// completes first; the writer then flushes the sink.
    #[instrument(name = "audio_stream_stop", skip(self), fields(sink = %self.sink_name))]
    pub fn stop(&self) {
        let Some(running) = self.lock_state().take() else {
            debug!("Audio stream not running");
            return;
        };

        let discarded = running.producer.occupied_len();
        running.producer.close();
        if let Err(e) = running.writer.join() {
            error!(error = ?e, "Audio writer panicked");
        }

        self.metrics.set_buffered_len(0);
        info!(
            discarded,
            written = self.metrics.written_bytes(),
            dropped = self.metrics.dropped_chunks(),
            "Audio stream stopped"
        );
    }

    pub fn is_running(&self) -> bool {
        self.lock_state().is_some()
    }

    /// Submit one audio chunk
    ///
    /// Returns the chunk length if it was admitted, 0 otherwise. Never admits
    /// part of a chunk.
    pub fn submit_audio(&self, chunk: &[u8]) -> usize {
        self.try_submit_audio(chunk).unwrap_or(0)
    }

    /// Same as [`submit_audio`](Self::submit_audio) but reports why a chunk
    /// was not admitted
    pub fn try_submit_audio(&self, chunk: &[u8]) -> Result<usize, SubmitError> {
        let len = chunk.len();
        let Some(producer) = self.producer() else {
            observability::record_audio_chunk(ChunkOutcome::NotRunning, len);
            return Err(SubmitError::NotRunning);
        };

        if chunk.is_empty() {
            self.metrics.inc_rejected_chunks();
            observability::record_audio_chunk(ChunkOutcome::Empty, len);
            return Err(SubmitError::EmptyChunk);
        }
        if len > self.config.max_chunk_len {
            self.metrics.inc_rejected_chunks();
            observability::record_audio_chunk(ChunkOutcome::Oversized, len);
            warn!(len, max = self.config.max_chunk_len, "Oversized audio chunk rejected");
            return Err(SubmitError::Oversized {
                len,
                max: self.config.max_chunk_len,
            });
        }

        if !producer.push_all(chunk, self.config.send_timeout()) {
            if producer.is_closed() {
                observability::record_audio_chunk(ChunkOutcome::NotRunning, len);
                return Err(SubmitError::NotRunning);
            }
            self.metrics.record_dropped(len);
            observability::record_audio_chunk(ChunkOutcome::BufferFull, len);
            warn!(len, "Ring buffer full, audio chunk dropped");
            return Err(SubmitError::BufferFull { len });
        }

        let occupied = producer.occupied_len();
        self.metrics.record_admitted(len);
        self.metrics.set_buffered_len(occupied);
        observability::record_audio_chunk(ChunkOutcome::Admitted, len);
        observability::record_ring_occupancy(occupied, producer.capacity());
        trace!(len, occupied, "Audio chunk admitted");
        Ok(len)
    }

    /// Unread bytes in the ring (0 when stopped)
    pub fn buffered_len(&self) -> usize {
        self.producer()
            .map(|producer| producer.occupied_len())
            .unwrap_or(0)
    }

    /// Get current metrics
    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }

    fn producer(&self) -> Option<Arc<RingProducer>> {
        self.lock_state()
            .as_ref()
            .map(|running| Arc::clone(&running.producer))
    }

    fn check_config(&self) -> Result<(), StreamError> {
        let config = &self.config;
        if config.ring_capacity == 0 {
            return Err(StreamError::invalid_config("ring_capacity", "must be positive"));
        }
        if config.max_run_len == 0 {
            return Err(StreamError::invalid_config("max_run_len", "must be positive"));
        }
        if config.max_chunk_len > config.ring_capacity {
            return Err(StreamError::invalid_config(
                "max_chunk_len",
                format!(
                    "{} exceeds ring capacity {}",
                    config.max_chunk_len, config.ring_capacity
                ),
            ));
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<Running>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AudioStream {
    fn drop(&mut self) {
        self.stop();
    }
}
