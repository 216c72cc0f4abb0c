//! Error types for the shared-store layer

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur in the shared-store layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Invalid magic word in the configuration blob
    #[error("Invalid magic word: expected {expected:08x}, found {found:08x}")]
    InvalidMagic {
        /// Expected magic word
        expected: u32,
        /// Found magic word
        found: u32,
    },

    /// Unsupported configuration version
    #[error("Unsupported version: {version}, supported: {supported}")]
    UnsupportedVersion {
        /// Version found
        version: u32,
        /// Supported version
        supported: u32,
    },

    /// Checksum verification failed
    #[error("Checksum verification failed: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Expected checksum
        expected: u32,
        /// Computed checksum
        computed: u32,
    },

    /// Invalid blob layout or corrupted data
    #[error("Invalid format: {reason}")]
    InvalidFormat {
        /// Reason for invalid format
        reason: String,
    },

    /// A region's declared payload runs past the end of the blob
    #[error("Region {region} overruns blob: offset {offset} + length {length} > {capacity}")]
    RegionOverrun {
        /// Region identifier
        region: u32,
        /// Region payload offset (words)
        offset: usize,
        /// Declared payload length (words)
        length: usize,
        /// Blob capacity (words)
        capacity: usize,
    },

    /// A required region is absent from the configuration blob
    #[error("Missing region: {region}")]
    MissingRegion {
        /// Region name
        region: &'static str,
    },

    /// Key-lookup table entries are mis-sorted or overlapping
    #[error("Key-lookup table mis-sorted at entry {index}")]
    KeyTableUnsorted {
        /// Index of the offending entry
        index: usize,
    },

    /// A key range's worst-case row address does not fit the address space
    #[error(
        "Key range {index} overflows the address space: base {base_address} + \
         {key_span} rows of {row_stride} words"
    )]
    KeyRangeOverflow {
        /// Index of the offending entry
        index: usize,
        /// Base row address of the range
        base_address: u32,
        /// Keys covered beyond `key_min`
        key_span: u32,
        /// Words per row
        row_stride: u32,
    },

    /// A row buffer is shorter than its header claims
    #[error("Row truncated: need {needed} words, have {available}")]
    RowTruncated {
        /// Words required by the row header
        needed: usize,
        /// Words actually available
        available: usize,
    },

    /// Shared-store access outside the allocated range
    #[error("Store access out of bounds: address {address} + {words} words > capacity {capacity}")]
    OutOfBounds {
        /// Word address of the access
        address: u32,
        /// Length of the access in words
        words: usize,
        /// Store capacity in words
        capacity: usize,
    },
}

impl StorageError {
    /// Create an invalid format error
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StorageError::invalid_format("truncated region table");
        assert!(matches!(err, StorageError::InvalidFormat { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::InvalidMagic {
            expected: 0x53594E46,
            found: 0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid magic word"));

        let err = StorageError::KeyTableUnsorted { index: 3 };
        assert!(format!("{}", err).contains("entry 3"));
    }
}
