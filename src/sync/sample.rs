//! A lock-free circular buffer for high-frequency sampling.
//!
//! Built for workloads where the sampling rate vastly outweighs the
//! inspection rate (monitoring, latency capture). Writers are wait-free:
//! a fetch-add on a shared cursor followed by one atomic slot store.
//! Readers pay O(capacity) to copy the ring and then trim away every
//! slot the writers may have touched during the copy, so a snapshot
//! only ever contains samples that were stably present.

use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam_utils::atomic::AtomicCell;
use crossbeam_utils::CachePadded;

/// A fixed-capacity concurrent sample ring.
///
/// Slot stores are wait-free for types no wider than a machine word
/// (`u64`, `i64`, `f64` and smaller); wider types degrade to an
/// internal lock inside [`AtomicCell`].
pub struct SampleBuffer<T> {
    cursor: CachePadded<AtomicU32>,
    slots: Box<[AtomicCell<T>]>,
}

impl<T: Copy + Default> SampleBuffer<T> {
    /// Create a buffer holding up to `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sample capacity must be a positive value");

        Self {
            cursor: CachePadded::new(AtomicU32::new(0)),
            slots: (0..capacity)
                .map(|_| AtomicCell::new(T::default()))
                .collect(),
        }
    }

    /// The fixed capacity of this buffer.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Record a sample at the cursor point of the ring.
    ///
    /// O(1) and wait-free for producers; older samples are overwritten
    /// once the ring is full.
    pub fn add(&self, sample: T) {
        let at = self.cursor.fetch_add(1, Ordering::AcqRel);
        self.slots[at as usize % self.slots.len()].store(sample);
    }

    /// Capture a stable, in-order snapshot of the buffer.
    ///
    /// The result is ordered oldest to newest. Samples the writers
    /// overwrote while the copy was in flight are trimmed from the
    /// front, so the snapshot may be shorter than the capacity. If the
    /// writers lapped the entire ring during the copy the result
    /// degrades to a best-effort window of `capacity` samples.
    pub fn snapshot(&self) -> Vec<T> {
        let capacity = self.slots.len() as i64;
        let before = self.cursor.load(Ordering::Acquire);

        // Nothing was ever written; skip the copy.
        if before == 0 {
            return Vec::new();
        }

        let copy: Vec<T> = self.slots.iter().map(AtomicCell::load).collect();

        let after = self.cursor.load(Ordering::Acquire);
        let overwritten = i64::from(after.wrapping_sub(before));

        let mut size = capacity - overwritten;
        let mut cursor = i64::from(before) - 1;

        // The writers replaced the whole ring while we copied. Treat
        // the copy as a full window ending at the last stable slot.
        if size <= 0 {
            size = capacity;
            cursor = size - 1;
        }

        let mut start = cursor - (size - 1);

        // The ring never filled: the stable window is the written
        // prefix.
        if cursor < capacity {
            size = cursor + 1;
            start = 0;
        }

        let start_of_copy = (start % capacity) as usize;
        let end_of_copy = (cursor % capacity) as usize;

        let mut stable = Vec::with_capacity(size as usize);

        if start_of_copy > end_of_copy {
            stable.extend_from_slice(&copy[start_of_copy..]);
            stable.extend_from_slice(&copy[..=end_of_copy]);
        } else {
            stable.extend_from_slice(&copy[start_of_copy..=end_of_copy]);
        }

        stable
    }

    /// Capture a snapshot of the complete buffer, retrying until no
    /// sample was trimmed.
    ///
    /// On a busy buffer this usually succeeds within one or two
    /// iterations, but a sustained storm of writers can make it
    /// expensive.
    pub fn complete_snapshot(&self) -> Vec<T> {
        loop {
            let snapshot = self.snapshot();

            if snapshot.len() == self.slots.len() {
                return snapshot;
            }
        }
    }
}
