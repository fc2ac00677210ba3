//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
///
/// Capacity and policy rejections are not errors: insert and extract report
/// them as zero or partial amounts. This type covers usage errors only.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// A slot index beyond the end of a slotted storage was addressed.
    #[error("slot {index} is out of bounds, this storage has {slot_count} slots")]
    SlotOutOfBounds {
        /// The slot index that was requested.
        index: usize,
        /// The number of slots the storage actually has.
        slot_count: usize,
    },
}

impl StorageError {
    /// Creates a slot out-of-bounds error.
    #[must_use]
    pub fn slot_out_of_bounds(index: usize, slot_count: usize) -> Self {
        Self::SlotOutOfBounds { index, slot_count }
    }
}
