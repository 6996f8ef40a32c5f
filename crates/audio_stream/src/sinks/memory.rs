//! MemorySink - captures PCM into a shared buffer

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Bytes, BytesMut};
use contracts::{AudioSink, ContractError};

/// Sink that keeps every byte it is given
///
/// Clones share the same buffer, so a test can keep one handle while the
/// stream owns another.
#[derive(Clone)]
pub struct MemorySink {
    name: String,
    buffer: Arc<Mutex<BytesMut>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer: Arc::new(Mutex::new(BytesMut::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of everything captured so far
    pub fn contents(&self) -> Vec<u8> {
        self.lock().to_vec()
    }

    /// Take everything captured so far, leaving the buffer empty
    pub fn take(&self) -> Bytes {
        self.lock().split().freeze()
    }

    fn lock(&self) -> MutexGuard<'_, BytesMut> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, pcm: &[u8]) -> Result<usize, ContractError> {
        self.lock().extend_from_slice(pcm);
        Ok(pcm.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let mut sink = MemorySink::new("mem");
        let observer = sink.clone();

        sink.write(&[1, 2, 3]).unwrap();
        assert_eq!(observer.len(), 3);
        assert_eq!(observer.take(), Bytes::from_static(&[1, 2, 3]));
        assert!(sink.is_empty());
    }
}
