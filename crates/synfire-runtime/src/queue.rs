//! Spike input queue
//!
//! A bounded single-producer/single-consumer ring of routing keys. The
//! producer is the packet-receive interrupt handler; the consumer is the
//! tick scheduler. Capacity is a power of two so index arithmetic is
//! masking, and visibility is a release store on the producer's tail paired
//! with an acquire load on the consumer's side. Overflow and underflow are
//! counted, never propagated.

use crate::error::{Result, RuntimeError};
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Default spike queue capacity
pub const DEFAULT_SPIKE_QUEUE_CAPACITY: usize = 256;

/// Bounded SPSC queue of spike routing keys
pub struct SpikeQueue {
    buffer: UnsafeCell<Box<[u32]>>,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    overflow_count: AtomicU64,
    underflow_count: AtomicU64,
}

impl SpikeQueue {
    /// Create a queue with the given capacity (must be a power of two)
    ///
    /// One slot is reserved to distinguish full from empty, so the queue
    /// holds `capacity - 1` keys.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(RuntimeError::invalid_parameter(
                "capacity",
                capacity.to_string(),
                "power of two >= 2",
            ));
        }
        Ok(Self {
            buffer: UnsafeCell::new(vec![0u32; capacity].into_boxed_slice()),
            mask: capacity - 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overflow_count: AtomicU64::new(0),
            underflow_count: AtomicU64::new(0),
        })
    }

    /// Push a routing key (producer side)
    ///
    /// Returns `false` and counts the overflow when the queue is full;
    /// stored keys are never disturbed.
    pub fn push(&self, key: u32) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let next_tail = (tail + 1) & self.mask;
        let head = self.head.load(Ordering::Acquire);

        if next_tail == head {
            self.overflow_count.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        unsafe {
            (*self.buffer.get())[tail] = key;
        }
        self.tail.store(next_tail, Ordering::Release);
        true
    }

    /// Pop the oldest routing key (consumer side)
    ///
    /// Returns `None` and counts the underflow when the queue is empty.
    pub fn pop(&self) -> Option<u32> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head == tail {
            self.underflow_count.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let key = unsafe { (*self.buffer.get())[head] };
        self.head.store((head + 1) & self.mask, Ordering::Release);
        Some(key)
    }

    /// Number of keys currently queued (approximate under concurrency)
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head) & self.mask
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable capacity in keys
    pub fn capacity(&self) -> usize {
        self.mask
    }

    /// Pushes rejected because the queue was full
    pub fn overflow_count(&self) -> u64 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Pops attempted while the queue was empty
    pub fn underflow_count(&self) -> u64 {
        self.underflow_count.load(Ordering::Relaxed)
    }
}

// One producer and one consumer may touch the buffer concurrently; the
// head/tail protocol keeps their index ranges disjoint.
unsafe impl Send for SpikeQueue {}
unsafe impl Sync for SpikeQueue {}

impl core::fmt::Debug for SpikeQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpikeQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("overflow_count", &self.overflow_count())
            .field("underflow_count", &self.underflow_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let queue = SpikeQueue::new(8).unwrap();
        for key in [10, 20, 30] {
            assert!(queue.push(key));
        }
        assert_eq!(queue.pop(), Some(10));
        assert_eq!(queue.pop(), Some(20));
        assert_eq!(queue.pop(), Some(30));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.underflow_count(), 1);
    }

    #[test]
    fn test_overflow_counted_and_contents_preserved() {
        let queue = SpikeQueue::new(8).unwrap();
        for key in 0..7 {
            assert!(queue.push(key));
        }
        // Full: 5 more pushes fail
        for key in 100..105 {
            assert!(!queue.push(key));
        }
        assert_eq!(queue.overflow_count(), 5);
        for key in 0..7 {
            assert_eq!(queue.pop(), Some(key));
        }
    }

    #[test]
    fn test_wrap_around() {
        let queue = SpikeQueue::new(4).unwrap();
        for round in 0..10u32 {
            assert!(queue.push(round));
            assert!(queue.push(round + 100));
            assert_eq!(queue.pop(), Some(round));
            assert_eq!(queue.pop(), Some(round + 100));
        }
        assert_eq!(queue.overflow_count(), 0);
    }

    #[test]
    fn test_rejects_bad_capacity() {
        assert!(SpikeQueue::new(0).is_err());
        assert!(SpikeQueue::new(1).is_err());
        assert!(SpikeQueue::new(12).is_err());
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        let queue = Arc::new(SpikeQueue::new(128).unwrap());
        let producer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                let mut sent = 0u32;
                while sent < 10_000 {
                    if queue.push(sent) {
                        sent += 1;
                    }
                }
            })
        };

        let mut expected = 0u32;
        while expected < 10_000 {
            if let Some(key) = queue.pop() {
                assert_eq!(key, expected);
                expected += 1;
            }
        }
        producer.join().unwrap();
    }
}
