// src/ring_buffer.rs
//
// Fixed-capacity circular sample queue.
//
// Overflow evicts the oldest unread samples so new data is never dropped.
// Underflow is all-or-nothing: a pull either fills the whole destination
// or leaves the buffer untouched.

use crate::error::{ConfigResult, ConfigurationError};

/// Counters for the non-fatal events a ring buffer can hit.
///
/// The buffer never logs from the audio thread; owners read these counters
/// and forward them as diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Pushes that had to evict unread samples.
    pub overflows: u64,
    /// Total samples evicted by overflowing pushes.
    pub evicted: u64,
    /// Pulls that requested more than was available.
    pub underflows: u64,
    /// Pushes with no data.
    pub empty_pushes: u64,
}

/// Single-threaded ring buffer of `f32` samples.
///
/// Owned exclusively by one [`FrameProcessor`](crate::frame_processor::FrameProcessor)
/// and only ever touched from the audio thread, so no atomics are involved.
#[derive(Debug)]
pub struct RingBuffer {
    store: Box<[f32]>,
    read_index: usize,
    write_index: usize,
    available: usize,
    stats: BufferStats,
}

impl RingBuffer {
    /// Allocate a buffer holding exactly `capacity` samples.
    pub fn new(capacity: usize) -> ConfigResult<Self> {
        if capacity == 0 {
            return Err(ConfigurationError::ZeroSize {
                what: "ring buffer capacity",
            });
        }

        Ok(Self {
            store: vec![0.0; capacity].into_boxed_slice(),
            read_index: 0,
            write_index: 0,
            available: 0,
            stats: BufferStats::default(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.len()
    }

    /// Samples written but not yet read.
    #[inline]
    pub fn available_frames(&self) -> usize {
        self.available
    }

    #[inline]
    pub fn free_frames(&self) -> usize {
        self.capacity() - self.available
    }

    #[inline]
    pub fn stats(&self) -> BufferStats {
        self.stats
    }

    /// Append `data`, evicting the oldest unread samples if it does not fit.
    ///
    /// Returns the number of samples written, which is always `data.len()`.
    /// A push larger than the whole buffer is a sizing bug and fails.
    pub fn push(&mut self, data: &[f32]) -> ConfigResult<usize> {
        let len = data.len();
        if len == 0 {
            self.stats.empty_pushes += 1;
            return Ok(0);
        }

        let capacity = self.capacity();
        if len > capacity {
            return Err(ConfigurationError::PushExceedsCapacity {
                requested: len,
                capacity,
            });
        }

        let free = self.free_frames();
        if len > free {
            let deficit = len - free;
            self.read_index = (self.read_index + deficit) % capacity;
            self.available -= deficit;
            self.stats.overflows += 1;
            self.stats.evicted += deficit as u64;
        }

        // Tail segment up to the end of the store, then the rest from the head.
        let tail = len.min(capacity - self.write_index);
        self.store[self.write_index..self.write_index + tail].copy_from_slice(&data[..tail]);
        self.store[..len - tail].copy_from_slice(&data[tail..]);

        self.write_index = (self.write_index + len) % capacity;
        self.available += len;

        Ok(len)
    }

    /// Fill `destination` with the oldest unread samples.
    ///
    /// Returns `destination.len()` on success. If fewer samples are buffered
    /// nothing is read and 0 is returned.
    pub fn pull(&mut self, destination: &mut [f32]) -> usize {
        let len = destination.len();
        if len == 0 {
            return 0;
        }

        if self.available < len {
            self.stats.underflows += 1;
            return 0;
        }

        let capacity = self.capacity();
        let tail = len.min(capacity - self.read_index);
        destination[..tail].copy_from_slice(&self.store[self.read_index..self.read_index + tail]);
        destination[tail..].copy_from_slice(&self.store[..len - tail]);

        self.read_index = (self.read_index + len) % capacity;
        self.available -= len;

        len
    }

    /// Drop all buffered samples. Keeps the allocation and the stats.
    pub fn clear(&mut self) {
        self.read_index = 0;
        self.write_index = 0;
        self.available = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(from: u32, to: u32) -> Vec<f32> {
        (from..=to).map(|v| v as f32).collect()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            RingBuffer::new(0).unwrap_err(),
            ConfigurationError::ZeroSize {
                what: "ring buffer capacity"
            }
        );
    }

    #[test]
    fn test_round_trip() {
        let mut rb = RingBuffer::new(1024).unwrap();
        assert_eq!(rb.push(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 5);

        let mut out = [0.0; 5];
        assert_eq!(rb.pull(&mut out), 5);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(rb.available_frames(), 0);
    }

    #[test]
    fn test_push_increases_available_by_len() {
        let mut rb = RingBuffer::new(16).unwrap();
        for len in [1usize, 3, 5, 7] {
            let before = rb.available_frames();
            rb.push(&vec![0.5; len]).unwrap();
            assert_eq!(rb.available_frames(), before + len);
        }
        assert_eq!(rb.stats().overflows, 0);
    }

    #[test]
    fn test_empty_push_is_noop() {
        let mut rb = RingBuffer::new(8).unwrap();
        rb.push(&[1.0, 2.0]).unwrap();
        assert_eq!(rb.push(&[]).unwrap(), 0);
        assert_eq!(rb.available_frames(), 2);
        assert_eq!(rb.stats().empty_pushes, 1);
    }

    #[test]
    fn test_push_larger_than_capacity_fails() {
        let mut rb = RingBuffer::new(4).unwrap();
        let err = rb.push(&[0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::PushExceedsCapacity {
                requested: 5,
                capacity: 4
            }
        );
        assert_eq!(rb.available_frames(), 0);
    }

    #[test]
    fn test_push_exactly_capacity() {
        let mut rb = RingBuffer::new(4).unwrap();
        assert_eq!(rb.push(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 4);
        assert_eq!(rb.free_frames(), 0);

        let mut out = [0.0; 4];
        assert_eq!(rb.pull(&mut out), 4);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_overflow_evicts_oldest_across_wrap() {
        let mut rb = RingBuffer::new(10).unwrap();
        rb.push(&ramp(1, 8)).unwrap();
        assert_eq!(rb.push(&ramp(9, 12)).unwrap(), 4);

        assert_eq!(rb.available_frames(), 10);
        let stats = rb.stats();
        assert_eq!(stats.overflows, 1);
        assert_eq!(stats.evicted, 2);

        let mut first = [0.0; 8];
        assert_eq!(rb.pull(&mut first), 8);
        assert_eq!(first.to_vec(), ramp(3, 10));

        let mut second = [0.0; 2];
        assert_eq!(rb.pull(&mut second), 2);
        assert_eq!(second.to_vec(), ramp(11, 12));
        assert_eq!(rb.available_frames(), 0);
    }

    #[test]
    fn test_overflow_preserves_order_over_many_pushes() {
        let mut rb = RingBuffer::new(7).unwrap();
        let mut next = 0u32;
        for len in [3usize, 5, 2, 6, 4, 7, 1] {
            let chunk: Vec<f32> = (next..next + len as u32).map(|v| v as f32).collect();
            next += len as u32;
            rb.push(&chunk).unwrap();
        }

        // Only the newest `capacity` samples survive, in order.
        let mut out = [0.0; 7];
        assert_eq!(rb.pull(&mut out), 7);
        let expected: Vec<f32> = (next - 7..next).map(|v| v as f32).collect();
        assert_eq!(out.to_vec(), expected);
    }

    #[test]
    fn test_underflow_leaves_state_unchanged() {
        let mut rb = RingBuffer::new(8).unwrap();
        rb.push(&[1.0, 2.0, 3.0]).unwrap();

        let mut out = [9.0; 5];
        assert_eq!(rb.pull(&mut out), 0);
        assert_eq!(out, [9.0; 5]);
        assert_eq!(rb.available_frames(), 3);
        assert_eq!(rb.stats().underflows, 1);

        let mut out = [0.0; 3];
        assert_eq!(rb.pull(&mut out), 3);
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_pull_is_noop() {
        let mut rb = RingBuffer::new(8).unwrap();
        assert_eq!(rb.pull(&mut []), 0);
        assert_eq!(rb.stats().underflows, 0);
    }

    #[test]
    fn test_pull_wraps_around_end() {
        let mut rb = RingBuffer::new(6).unwrap();
        rb.push(&[0.0; 4]).unwrap();
        let mut sink = [0.0; 4];
        rb.pull(&mut sink);

        // Write index is at 4, so this write splits 2 + 3.
        rb.push(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mut out = [0.0; 5];
        assert_eq!(rb.pull(&mut out), 5);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_clear_is_idempotent_and_reusable() {
        let mut rb = RingBuffer::new(10).unwrap();
        rb.push(&ramp(1, 7)).unwrap();
        rb.clear();
        rb.clear();
        assert_eq!(rb.available_frames(), 0);
        assert_eq!(rb.capacity(), 10);

        rb.push(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let mut out = [0.0; 5];
        assert_eq!(rb.pull(&mut out), 5);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(rb.available_frames(), 0);
    }
}
