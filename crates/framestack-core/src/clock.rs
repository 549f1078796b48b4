use std::sync::atomic::{AtomicU64, Ordering};

use framestack_types::{EventPosition, FrameId};

/// Assigns monotonically increasing, per-shard sequence numbers to events.
///
/// Each frame is pinned to one shard (`hash(frame_id) mod shard_count`), so
/// concurrent appends to different frames never contend on the same
/// counter, while events within a single frame still get a total order via
/// `(seq, shard)`.
pub struct Clock {
    shard_count: u16,
    counters: Vec<AtomicU64>,
}

impl Clock {
    pub fn new(shard_count: u16) -> Self {
        let shard_count = shard_count.max(1);
        let counters = (0..shard_count).map(|_| AtomicU64::new(0)).collect();
        Self { shard_count, counters }
    }

    pub fn shard_for(&self, frame_id: FrameId) -> u16 {
        let uuid_bytes = frame_id.as_uuid().into_bytes();
        let mut acc: u64 = 0;
        for chunk in uuid_bytes.chunks(8) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            acc ^= u64::from_le_bytes(buf);
        }
        (acc % self.shard_count as u64) as u16
    }

    /// Allocate the next position for an event appended under `frame_id`.
    pub fn next_position(&self, frame_id: FrameId) -> EventPosition {
        let shard = self.shard_for(frame_id);
        let seq = self.counters[shard as usize].fetch_add(1, Ordering::SeqCst);
        EventPosition { seq, shard }
    }

    /// The number of shards this clock was built with.
    pub fn shard_count(&self) -> u16 {
        self.shard_count
    }

    /// Raise `shard`'s counter so its next `next_position` hands out
    /// `next_seq` or later. Never lowers the counter — rehydrating a clock
    /// against a persisted log (on reopening an existing store) must not
    /// undo sequence numbers already allocated in this process.
    pub fn seed_shard(&self, shard: u16, next_seq: u64) {
        let Some(counter) = self.counters.get(shard as usize) else { return };
        let mut current = counter.load(Ordering::SeqCst);
        while next_seq > current {
            match counter.compare_exchange(current, next_seq, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(16)
    }
}
