//! Error types for the page cache.

use crate::types::PageId;
use thiserror::Error;

/// Result type alias for page cache operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur in the page cache
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record does not fit in the page's remaining free space
    #[error("Insufficient space: need {needed} bytes but only {available} available")]
    InsufficientSpace { needed: usize, available: usize },

    /// Computed record placement would run past the end of the page
    #[error("Record at offset {offset} with length {len} overflows the page")]
    OffsetOverflow { offset: usize, len: usize },

    /// Slot directory in the header region has no room for another entry
    #[error("Slot directory full: at most {max} records per page")]
    SlotDirectoryFull { max: usize },

    /// Zero-length records have no representable slot range
    #[error("Record must not be empty")]
    EmptyRecord,

    /// Record index is past the end of the slot directory
    #[error("Record index {index} out of bounds (count: {count})")]
    InvalidIndex { index: usize, count: usize },

    /// Slot offsets describe an empty or out-of-page byte range
    #[error("Corrupt boundary for record {index}: [{start}, {end})")]
    CorruptBoundary {
        index: usize,
        start: usize,
        end: usize,
    },

    /// No record matched the search key
    #[error("Record not found")]
    NotFound,

    /// Raw buffer could not be interpreted as a page
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer than a full page of bytes were available in the backing store
    #[error("Short read of page {page_id}: got {read} bytes")]
    ShortRead { page_id: PageId, read: usize },

    /// Replacement policy was asked for a victim while tracking nothing
    #[error("Replacement policy is empty")]
    EmptyPolicy,

    /// Replacement policy chose a page the pool does not hold
    #[error("Eviction target {0} is not resident")]
    EvictionTargetMissing(PageId),

    /// Page expected in the pool was not resident
    #[error("Page {0} not resident")]
    PageNotResident(PageId),

    /// Eviction attempted with no resident frames
    #[error("Buffer pool is empty")]
    EmptyBuffer,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    /// Create an invalid page error
    pub fn invalid_page(msg: impl Into<String>) -> Self {
        Self::InvalidPage(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error signals a broken pool/policy invariant rather than
    /// bad input or a failing environment.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::EmptyPolicy
                | Self::EvictionTargetMissing(_)
                | Self::EmptyBuffer
                | Self::PageNotResident(_)
        )
    }
}
