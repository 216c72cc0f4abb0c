//! Routing-key to synaptic-row resolution
//!
//! Each core holds a read-only, sorted table mapping contiguous key ranges
//! to row storage. A spike key resolves to the row of the pre-synaptic
//! neuron it names; keys outside every range are dropped by the caller.

use crate::error::{Result, StorageError};

/// Location and shape of one synaptic row in the shared store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLocator {
    /// Word address of the row
    pub address: u32,
    /// Row length in words
    pub words: u32,
    /// Whether the row uses the plastic layout
    pub plastic: bool,
}

/// One key range of the lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyRange {
    /// Lowest key of the range (inclusive)
    pub key_min: u32,
    /// Highest key of the range (inclusive)
    pub key_max: u32,
    /// Word address of the range's first row
    pub base_address: u32,
    /// Words per row within the range
    pub row_stride: u32,
    /// Whether rows in this range use the plastic layout
    pub plastic: bool,
}

/// Words per serialized `KeyRange` entry in the KeyLookup region
pub const KEY_RANGE_WORDS: usize = 5;

/// Sorted key-range table with binary-search resolution
#[derive(Debug, Clone)]
pub struct KeyLookup {
    entries: Vec<KeyRange>,
}

impl KeyLookup {
    /// Build a lookup table, validating sort order, non-overlap and address
    /// arithmetic
    ///
    /// A mis-sorted table is a fatal configuration error: resolution would
    /// silently misroute spikes. A range whose last row runs past the
    /// address space is equally fatal; checking the worst case here keeps
    /// per-spike resolution free of overflow.
    pub fn new(entries: Vec<KeyRange>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.key_min > entry.key_max {
                return Err(StorageError::KeyTableUnsorted { index: i });
            }
            if i > 0 && entry.key_min <= entries[i - 1].key_max {
                return Err(StorageError::KeyTableUnsorted { index: i });
            }
            // Worst-case end address: the word past key_max's row
            let key_span = entry.key_max - entry.key_min;
            let end = key_span
                .checked_mul(entry.row_stride)
                .and_then(|offset| entry.base_address.checked_add(offset))
                .and_then(|last_row| last_row.checked_add(entry.row_stride));
            if end.is_none() {
                return Err(StorageError::KeyRangeOverflow {
                    index: i,
                    base_address: entry.base_address,
                    key_span,
                    row_stride: entry.row_stride,
                });
            }
        }
        log::debug!("key lookup table loaded: {} ranges", entries.len());
        Ok(Self { entries })
    }

    /// Parse the table from a KeyLookup region payload
    ///
    /// Layout: entry count, then five words per entry
    /// `{key_min, key_max, base_address, row_stride, flags}` with flag bit 0
    /// marking plastic rows.
    pub fn from_region(payload: &[u32]) -> Result<Self> {
        let count = *payload.first().ok_or_else(|| {
            StorageError::invalid_format("KeyLookup region empty")
        })? as usize;
        let needed = 1 + count * KEY_RANGE_WORDS;
        if payload.len() < needed {
            return Err(StorageError::invalid_format(format!(
                "KeyLookup region truncated: need {} words, have {}",
                needed,
                payload.len()
            )));
        }
        let entries = (0..count)
            .map(|i| {
                let w = &payload[1 + i * KEY_RANGE_WORDS..];
                KeyRange {
                    key_min: w[0],
                    key_max: w[1],
                    base_address: w[2],
                    row_stride: w[3],
                    plastic: w[4] & 1 != 0,
                }
            })
            .collect();
        Self::new(entries)
    }

    /// Resolve a spike key to its row locator
    ///
    /// Returns `None` when no range covers the key; the caller drops the
    /// spike and counts it.
    pub fn resolve(&self, key: u32) -> Option<RowLocator> {
        let i = self.entries.partition_point(|e| e.key_max < key);
        let entry = self.entries.get(i)?;
        if key < entry.key_min {
            return None;
        }
        // Cannot overflow: construction bounds the key_max address
        Some(RowLocator {
            address: entry.base_address + (key - entry.key_min) * entry.row_stride,
            words: entry.row_stride,
            plastic: entry.plastic,
        })
    }

    /// Number of key ranges in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
