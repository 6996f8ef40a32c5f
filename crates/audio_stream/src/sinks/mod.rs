//! Sink implementations
//!
//! Contains LogSink, FileSink, NullSink, MemorySink and the PacedSink wrapper.

mod file;
mod log;
mod memory;
mod null;
mod paced;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::memory::MemorySink;
pub use self::null::NullSink;
pub use self::paced::PacedSink;

use contracts::{AudioSink, ContractError, SinkConfig, SinkType};
use tracing::instrument;

/// Create a sink from configuration
///
/// A configured `paced_byte_rate` wraps the sink in a [`PacedSink`].
#[instrument(
    name = "create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn AudioSink>, ContractError> {
    let sink: Box<dyn AudioSink> = match config.sink_type {
        SinkType::Log => Box::new(LogSink::new(&config.name)),
        SinkType::Null => Box::new(NullSink::new(&config.name)),
        SinkType::File => Box::new(
            FileSink::from_params(&config.name, &config.params)
                .map_err(|e| ContractError::sink_open(&config.name, e.to_string()))?,
        ),
    };

    match config.paced_byte_rate {
        Some(0) => Err(ContractError::config_validation(
            "sink.paced_byte_rate",
            "must be positive",
        )),
        Some(rate) => Ok(Box::new(PacedSink::new(sink, rate))),
        None => Ok(sink),
    }
}
