//! Shared off-chip store access
//!
//! The simulation core reaches the shared store only through `SharedStore`,
//! the contract of the platform's DMA channels: word-addressed block reads
//! and writes, single-attempt, no retry. A failed transfer is a fatal
//! platform fault, surfaced as an error rather than retried.

use crate::error::{Result, StorageError};

/// Word-addressed block access to the shared store
pub trait SharedStore {
    /// Read `dst.len()` words starting at `address`
    fn read_words(&self, address: u32, dst: &mut [u32]) -> Result<()>;

    /// Write `src.len()` words starting at `address`
    fn write_words(&mut self, address: u32, src: &[u32]) -> Result<()>;
}

/// In-memory shared store
///
/// Stands in for the off-chip SDRAM in tests and host-side tooling.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    words: Vec<u32>,
}

impl MemoryStore {
    /// Allocate a zero-filled store of `capacity` words
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity],
        }
    }

    /// Wrap an existing word image
    pub fn from_words(words: Vec<u32>) -> Self {
        Self { words }
    }

    /// The full word image
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Mutable access to the full word image
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    fn span(&self, address: u32, words: usize) -> Result<core::ops::Range<usize>> {
        let start = address as usize;
        let end = start.checked_add(words).filter(|&e| e <= self.words.len());
        match end {
            Some(end) => Ok(start..end),
            None => Err(StorageError::OutOfBounds {
                address,
                words,
                capacity: self.words.len(),
            }),
        }
    }
}

impl SharedStore for MemoryStore {
    fn read_words(&self, address: u32, dst: &mut [u32]) -> Result<()> {
        let span = self.span(address, dst.len())?;
        dst.copy_from_slice(&self.words[span]);
        Ok(())
    }

    fn write_words(&mut self, address: u32, src: &[u32]) -> Result<()> {
        let span = self.span(address, src.len())?;
        self.words[span].copy_from_slice(src);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_round_trip() {
        let mut store = MemoryStore::new(16);
        store.write_words(4, &[1, 2, 3]).unwrap();
        let mut buf = [0u32; 3];
        store.read_words(4, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        // Neighbours untouched
        assert_eq!(store.words()[3], 0);
        assert_eq!(store.words()[7], 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut store = MemoryStore::new(8);
        let mut buf = [0u32; 4];
        assert!(store.read_words(6, &mut buf).is_err());
        assert!(store.write_words(7, &[0, 0]).is_err());
        // Exactly at the end is fine
        assert!(store.write_words(6, &[0, 0]).is_ok());
    }

    #[test]
    fn test_overflowing_address() {
        let store = MemoryStore::new(8);
        let mut buf = [0u32; 1];
        assert!(store.read_words(u32::MAX, &mut buf).is_err());
    }
}
