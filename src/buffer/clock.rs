//! Clock (second-chance) replacement policy.
//!
//! Pages sit in a circular buffer with a reference bit each.
//!
//! - On hit: set the reference bit
//! - On add: append with the reference bit set
//! - On eviction: sweep from the hand; a referenced entry has its bit
//!   cleared and is skipped, the first unreferenced entry is evicted
//!
//! Hits scan the buffer linearly, which is fine at pool-sized capacities.

use crate::buffer::policy::ReplacementPolicy;
use crate::error::{Result, StorageError};
use crate::types::PageId;

#[derive(Debug, Clone, Copy)]
struct ClockEntry {
    page_id: PageId,
    referenced: bool,
}

/// Circular buffer of resident pages with a sweeping hand
#[derive(Debug)]
pub struct ClockReplacer {
    entries: Vec<ClockEntry>,
    /// Next entry to examine
    hand: usize,
    /// Maximum number of tracked pages
    capacity: usize,
}

impl ClockReplacer {
    /// Create a new clock replacer tracking at most `capacity` pages
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            hand: 0,
            capacity,
        }
    }

    /// Current hand position
    pub fn hand(&self) -> usize {
        self.hand
    }

    /// Whether `page_id` is tracked with its reference bit set
    pub fn is_referenced(&self, page_id: PageId) -> Option<bool> {
        self.entries
            .iter()
            .find(|entry| entry.page_id == page_id)
            .map(|entry| entry.referenced)
    }
}

impl ReplacementPolicy for ClockReplacer {
    fn access(&mut self, page_id: PageId) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.page_id == page_id) {
            entry.referenced = true;
        }
    }

    /// Appends only while below capacity; the caller evicts first when full
    fn add_page(&mut self, page_id: PageId) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.page_id == page_id) {
            entry.referenced = true;
            return;
        }

        if self.entries.len() < self.capacity {
            self.entries.push(ClockEntry {
                page_id,
                referenced: true,
            });
        } else {
            log::warn!(
                "clock is full ({} entries), not tracking page {}",
                self.capacity,
                page_id
            );
        }
    }

    fn evict(&mut self) -> Result<PageId> {
        if self.entries.is_empty() {
            return Err(StorageError::EmptyPolicy);
        }

        // Terminates within two sweeps: the first clears every bit
        loop {
            let entry = &mut self.entries[self.hand];
            if !entry.referenced {
                let victim = entry.page_id;
                self.entries.remove(self.hand);
                if self.hand >= self.entries.len() {
                    self.hand = 0;
                }
                return Ok(victim);
            }

            entry.referenced = false;
            self.hand = (self.hand + 1) % self.entries.len();
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
