//! Bounded byte ring shared by audio producers and the writer thread
//!
//! Built on a split `HeapRb<u8>`. The producer half sits behind a mutex so
//! several producer contexts may submit; the consumer half is owned by the
//! writer thread. Two condvars carry the blocking:
//! - `space_ready` (paired with the producer lock): producers waiting for room
//! - `data_ready` (paired with `data_lock`): the consumer waiting for bytes
//!
//! The consumer reads runs in place and releases them only after the sink has
//! taken them, so occupied bytes include the run currently being written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use ringbuf::traits::{Consumer as _, Observer as _, Producer as _, Split as _};
use ringbuf::{HeapCons, HeapProd, HeapRb};

struct Shared {
    capacity: usize,
    producer: Mutex<HeapProd<u8>>,
    space_ready: Condvar,
    data_lock: Mutex<()>,
    data_ready: Condvar,
    closed: AtomicBool,
}

impl Shared {
    fn lock_producer(&self) -> MutexGuard<'_, HeapProd<u8>> {
        self.producer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_data(&self) -> MutexGuard<'_, ()> {
        self.data_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn wake_producers(&self) {
        let _guard = self.lock_producer();
        self.space_ready.notify_all();
    }

    fn wake_consumer(&self) {
        let _guard = self.lock_data();
        self.data_ready.notify_one();
    }
}

/// Producer handle; shareable across submitting threads
pub struct RingProducer {
    shared: Arc<Shared>,
}

/// Consumer handle; owned by exactly one reader
pub struct RingConsumer {
    inner: HeapCons<u8>,
    shared: Arc<Shared>,
}

/// Create a byte ring of `capacity` bytes
///
/// # Panics
/// Panics if `capacity` is zero.
pub fn byte_ring(capacity: usize) -> (RingProducer, RingConsumer) {
    let (producer, consumer) = HeapRb::<u8>::new(capacity).split();
    let shared = Arc::new(Shared {
        capacity,
        producer: Mutex::new(producer),
        space_ready: Condvar::new(),
        data_lock: Mutex::new(()),
        data_ready: Condvar::new(),
        closed: AtomicBool::new(false),
    });

    (
        RingProducer {
            shared: Arc::clone(&shared),
        },
        RingConsumer {
            inner: consumer,
            shared,
        },
    )
}

impl RingProducer {
    /// Admit all of `chunk` or none of it
    ///
    /// Waits up to `timeout` for enough vacant space. Returns false if the
    /// space never appeared, the chunk can never fit, or the ring is closed.
    /// An empty chunk is trivially admitted.
    pub fn push_all(&self, chunk: &[u8], timeout: Duration) -> bool {
        if chunk.is_empty() {
            return !self.shared.is_closed();
        }
        if chunk.len() > self.shared.capacity {
            return false;
        }

        let deadline = Instant::now() + timeout;
        let mut producer = self.shared.lock_producer();
        loop {
            if self.shared.is_closed() {
                return false;
            }
            if producer.vacant_len() >= chunk.len() {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            producer = self
                .shared
                .space_ready
                .wait_timeout(producer, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        let pushed = producer.push_slice(chunk);
        debug_assert_eq!(pushed, chunk.len());
        drop(producer);

        self.shared.wake_consumer();
        true
    }

    /// Unread bytes, including any run the consumer has not released yet
    pub fn occupied_len(&self) -> usize {
        self.shared.lock_producer().occupied_len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Stop admitting bytes and wake both sides
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.wake_producers();
        let _guard = self.shared.lock_data();
        self.shared.data_ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl RingConsumer {
    /// Block until bytes are available and borrow the first contiguous run
    ///
    /// The run is at most `max_len` bytes and stays in the ring until
    /// [`release`](Self::release). Returns `None` once the ring is closed.
    pub fn wait_run(&mut self, max_len: usize) -> Option<&[u8]> {
        {
            let mut guard = self.shared.lock_data();
            while !self.shared.is_closed() && self.inner.is_empty() {
                guard = self
                    .shared
                    .data_ready
                    .wait(guard)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        if self.shared.is_closed() {
            return None;
        }

        let (head, _) = self.inner.as_slices();
        let len = head.len().min(max_len);
        Some(&head[..len])
    }

    /// Return `len` bytes from the front of the ring to free space
    pub fn release(&mut self, len: usize) {
        let released = self.inner.skip(len);
        if released > 0 {
            self.shared.wake_producers();
        }
    }

    pub fn occupied_len(&self) -> usize {
        self.inner.occupied_len()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const NO_WAIT: Duration = Duration::ZERO;

    #[test]
    fn test_push_all_or_nothing() {
        let (producer, consumer) = byte_ring(8);

        assert!(producer.push_all(&[1, 2, 3, 4, 5], NO_WAIT));
        assert!(!producer.push_all(&[6, 7, 8, 9], NO_WAIT));
        assert_eq!(producer.occupied_len(), 5);
        assert_eq!(consumer.occupied_len(), 5);

        assert!(producer.push_all(&[6, 7, 8], NO_WAIT));
        assert_eq!(producer.occupied_len(), 8);
    }

    #[test]
    fn test_chunk_larger_than_capacity_rejected() {
        let (producer, _consumer) = byte_ring(4);
        assert!(!producer.push_all(&[0; 5], Duration::from_millis(50)));
        assert_eq!(producer.occupied_len(), 0);
    }

    #[test]
    fn test_run_borrowed_until_release() {
        let (producer, mut consumer) = byte_ring(8);
        assert!(producer.push_all(&[1, 2, 3, 4, 5, 6], NO_WAIT));

        assert_eq!(consumer.wait_run(4), Some(&[1, 2, 3, 4][..]));
        // nothing released yet, same run again
        assert_eq!(consumer.wait_run(4), Some(&[1, 2, 3, 4][..]));
        assert!(!producer.push_all(&[7, 8, 9], NO_WAIT));

        consumer.release(4);
        assert_eq!(consumer.wait_run(4), Some(&[5, 6][..]));
        assert!(producer.push_all(&[7, 8, 9], NO_WAIT));
    }

    #[test]
    fn test_wrapped_run_split_at_boundary() {
        let (producer, mut consumer) = byte_ring(8);
        assert!(producer.push_all(&[0; 6], NO_WAIT));
        consumer.release(6);

        assert!(producer.push_all(&[1, 2, 3, 4], NO_WAIT));
        assert_eq!(consumer.wait_run(16), Some(&[1, 2][..]));
        consumer.release(2);
        assert_eq!(consumer.wait_run(16), Some(&[3, 4][..]));
    }

    #[test]
    fn test_producer_waits_for_release() {
        let (producer, mut consumer) = byte_ring(4);
        assert!(producer.push_all(&[1, 2, 3, 4], NO_WAIT));

        let reader = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let len = consumer.wait_run(4).map(<[u8]>::len).unwrap_or(0);
            consumer.release(len);
            consumer
        });

        assert!(producer.push_all(&[5, 6], Duration::from_secs(2)));
        let consumer = reader.join().unwrap();
        assert_eq!(consumer.occupied_len(), 2);
    }

    #[test]
    fn test_close_wakes_consumer() {
        let (producer, mut consumer) = byte_ring(4);

        let reader = thread::spawn(move || consumer.wait_run(4).is_none());
        thread::sleep(Duration::from_millis(20));
        producer.close();

        assert!(reader.join().unwrap());
        assert!(producer.is_closed());
        assert!(!producer.push_all(&[1], NO_WAIT));
    }

    #[test]
    fn test_close_wakes_waiting_producer() {
        let (producer, _consumer) = byte_ring(2);
        let producer = Arc::new(producer);
        assert!(producer.push_all(&[1, 2], NO_WAIT));

        let waiting = Arc::clone(&producer);
        let writer = thread::spawn(move || waiting.push_all(&[3], Duration::from_secs(5)));
        thread::sleep(Duration::from_millis(20));
        producer.close();

        let started = Instant::now();
        assert!(!writer.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
