//! Page header structure.
//!
//! The header region occupies the first `HEADER_SIZE` bytes of every page and
//! holds the record count followed by the slot directory.

use crate::types::{COUNT_SIZE, HEADER_SIZE, MAX_RECORDS, MAX_SLOTS, OFFSET_SIZE, PAGE_SIZE};

/// Page header structure
///
/// Layout (all fields big-endian u32):
/// ```text
/// Offset  Size  Description
/// 0       4     Number of records on this page
/// 4       4     Slot 0: start of record 0
/// 8       4     Slot 1: start of record 1 / end of record 0
/// ...
/// 4+4n    4     Slot n: end of the last record (n = record count)
/// ```
///
/// Unused slot entries are zero. An empty page stores no boundaries at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Number of records on this page
    pub record_count: u32,
    /// Record boundaries; entries `0..=record_count` are meaningful
    slots: [u32; MAX_SLOTS],
}

impl PageHeader {
    /// Create a header for an empty page
    pub fn new() -> Self {
        Self {
            record_count: 0,
            slots: [0; MAX_SLOTS],
        }
    }

    /// Read a page header from bytes
    ///
    /// Returns `None` if the buffer is shorter than the header region or the
    /// stored count cannot fit the slot directory.
    pub fn read(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }

        let record_count = u32::from_be_bytes(bytes[0..COUNT_SIZE].try_into().ok()?);
        if record_count as usize > MAX_RECORDS {
            return None;
        }

        let mut slots = [0u32; MAX_SLOTS];
        for (i, slot) in slots.iter_mut().enumerate() {
            let pos = Self::slot_position(i);
            *slot = u32::from_be_bytes(bytes[pos..pos + OFFSET_SIZE].try_into().ok()?);
        }

        Some(Self {
            record_count,
            slots,
        })
    }

    /// Write this header to bytes
    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0..COUNT_SIZE].copy_from_slice(&self.record_count.to_be_bytes());
        for (i, slot) in self.slots.iter().enumerate() {
            let pos = Self::slot_position(i);
            bytes[pos..pos + OFFSET_SIZE].copy_from_slice(&slot.to_be_bytes());
        }
    }

    /// Byte position of slot entry `index` within the page
    pub const fn slot_position(index: usize) -> usize {
        COUNT_SIZE + index * OFFSET_SIZE
    }

    /// Number of records as a `usize`
    pub fn count(&self) -> usize {
        self.record_count as usize
    }

    /// Get the slot entry at the given index
    pub fn slot(&self, index: usize) -> usize {
        self.slots[index] as usize
    }

    /// Set the slot entry at the given index
    pub fn set_slot(&mut self, index: usize, offset: usize) {
        self.slots[index] = offset as u32;
    }

    /// Byte range `[start, end)` of the record at `index` as recorded in the
    /// directory. Callers must bounds-check `index` first.
    pub fn record_bounds(&self, index: usize) -> (usize, usize) {
        (self.slot(index), self.slot(index + 1))
    }

    /// Offset one past the last payload byte
    pub fn payload_end(&self) -> usize {
        if self.record_count == 0 {
            HEADER_SIZE
        } else {
            self.slot(self.count())
        }
    }

    /// Bytes occupied by record payloads
    pub fn payload_size(&self) -> usize {
        self.payload_end().saturating_sub(HEADER_SIZE)
    }

    /// Calculate free space available for new records
    ///
    /// Every record is charged one slot entry on top of its payload.
    pub fn free_space(&self) -> usize {
        let used = HEADER_SIZE + self.count() * OFFSET_SIZE + self.payload_size();
        PAGE_SIZE.saturating_sub(used)
    }
}

impl Default for PageHeader {
    fn default() -> Self {
        Self::new()
    }
}
