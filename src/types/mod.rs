//! Common types and page format constants.

mod page_id;

pub use page_id::PageId;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Size of the reserved header region holding the record count and slot directory
pub const HEADER_SIZE: usize = 128;

/// Width of the record count field at offset 0
pub const COUNT_SIZE: usize = 4;

/// Width of one slot directory entry
pub const OFFSET_SIZE: usize = 4;

/// Number of slot entries that fit in the header region after the count
pub const MAX_SLOTS: usize = (HEADER_SIZE - COUNT_SIZE) / OFFSET_SIZE;

/// Maximum number of records per page.
///
/// One slot entry is reserved for the end-of-payload boundary.
pub const MAX_RECORDS: usize = MAX_SLOTS - 1;
