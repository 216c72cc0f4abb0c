//! Delay-row buffer
//!
//! Rows whose delivery tick exceeds the native delay width are re-injected
//! here by the row kernels and replayed at their target tick exactly as if
//! a spike had just arrived for them. Entries are bucketed by
//! `target_tick mod slots`; each bucket is bounded and overflow is counted,
//! never propagated.

use synfire_storage::{RowLocator, Tick};

/// A row scheduled for replay at a future tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedRow {
    /// Tick at which the row is promoted back to the processing path
    pub target_tick: Tick,
    /// Row to replay
    pub locator: RowLocator,
    /// Whether the originating invocation was a flush
    pub flush: bool,
}

/// Bounded ring of delayed rows indexed by tick slot
#[derive(Debug)]
pub struct DelayRowBuffer {
    slots: Vec<Vec<DelayedRow>>,
    slot_mask: u32,
    max_per_slot: usize,
    overflow_count: u64,
}

impl DelayRowBuffer {
    /// Allocate `2^slot_bits` buckets holding at most `max_per_slot` rows each
    pub fn new(slot_bits: u32, max_per_slot: usize) -> Self {
        let slots = 1usize << slot_bits;
        Self {
            slots: (0..slots).map(|_| Vec::with_capacity(max_per_slot)).collect(),
            slot_mask: (slots - 1) as u32,
            max_per_slot,
            overflow_count: 0,
        }
    }

    /// Number of tick slots a target may be scheduled across
    pub fn horizon(&self) -> u32 {
        self.slot_mask + 1
    }

    /// Rows rejected because their bucket was full
    pub fn overflow_count(&self) -> u64 {
        self.overflow_count
    }

    /// Schedule a row; returns `false` and counts the overflow when full
    pub fn push(&mut self, row: DelayedRow) -> bool {
        let slot = &mut self.slots[(row.target_tick & self.slot_mask) as usize];
        if slot.len() == self.max_per_slot {
            self.overflow_count += 1;
            return false;
        }
        slot.push(row);
        true
    }

    /// Remove and return the rows whose target is exactly `tick`
    ///
    /// Entries sharing the bucket but targeting a later wrap of the ring
    /// stay in place.
    pub fn drain_due(&mut self, tick: Tick, out: &mut Vec<DelayedRow>) {
        let slot = &mut self.slots[(tick & self.slot_mask) as usize];
        let mut i = 0;
        while i < slot.len() {
            if slot[i].target_tick == tick {
                out.push(slot.swap_remove(i));
            } else {
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(address: u32) -> RowLocator {
        RowLocator {
            address,
            words: 8,
            plastic: false,
        }
    }

    fn row(target_tick: Tick, address: u32) -> DelayedRow {
        DelayedRow {
            target_tick,
            locator: locator(address),
            flush: false,
        }
    }

    #[test]
    fn test_due_rows_drained_at_target() {
        let mut buffer = DelayRowBuffer::new(4, 4);
        assert!(buffer.push(row(13, 0xA)));
        assert!(buffer.push(row(14, 0xB)));

        let mut due = Vec::new();
        buffer.drain_due(13, &mut due);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].locator.address, 0xA);

        due.clear();
        buffer.drain_due(13, &mut due);
        assert!(due.is_empty());

        buffer.drain_due(14, &mut due);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].locator.address, 0xB);
    }

    #[test]
    fn test_far_target_survives_shared_bucket() {
        let mut buffer = DelayRowBuffer::new(4, 4);
        // Ticks 3 and 19 share bucket 3 (mod 16)
        assert!(buffer.push(row(19, 0xC)));
        let mut due = Vec::new();
        buffer.drain_due(3, &mut due);
        assert!(due.is_empty());
        buffer.drain_due(19, &mut due);
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn test_overflow_counted() {
        let mut buffer = DelayRowBuffer::new(2, 2);
        assert!(buffer.push(row(5, 1)));
        assert!(buffer.push(row(5, 2)));
        assert!(!buffer.push(row(5, 3)));
        assert_eq!(buffer.overflow_count(), 1);

        // Stored entries are intact
        let mut due = Vec::new();
        buffer.drain_due(5, &mut due);
        assert_eq!(due.len(), 2);
    }

    #[test]
    fn test_flush_flag_preserved() {
        let mut buffer = DelayRowBuffer::new(2, 2);
        buffer.push(DelayedRow {
            target_tick: 7,
            locator: locator(9),
            flush: true,
        });
        let mut due = Vec::new();
        buffer.drain_due(7, &mut due);
        assert!(due[0].flush);
    }
}
