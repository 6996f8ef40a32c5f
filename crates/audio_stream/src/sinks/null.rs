//! NullSink - accepts and discards

use contracts::{AudioSink, ContractError};

/// Sink that swallows every byte
pub struct NullSink {
    name: String,
}

impl NullSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl AudioSink for NullSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, pcm: &[u8]) -> Result<usize, ContractError> {
        Ok(pcm.len())
    }
}
