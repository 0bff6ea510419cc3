//! FIFO (First In, First Out) replacement policy.
//!
//! Evicts pages in the order they were added. Accesses do not affect the
//! order.

use crate::buffer::policy::ReplacementPolicy;
use crate::error::{Result, StorageError};
use crate::types::PageId;
use std::collections::VecDeque;

/// Queue of resident pages in arrival order
#[derive(Debug, Default)]
pub struct FifoReplacer {
    queue: VecDeque<PageId>,
}

impl FifoReplacer {
    /// Create a new FIFO replacer sized for `capacity` pages
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
        }
    }
}

impl ReplacementPolicy for FifoReplacer {
    fn access(&mut self, _page_id: PageId) {}

    /// Re-adding a tracked page keeps its original position
    fn add_page(&mut self, page_id: PageId) {
        if !self.queue.contains(&page_id) {
            self.queue.push_back(page_id);
        }
    }

    fn evict(&mut self) -> Result<PageId> {
        self.queue.pop_front().ok_or(StorageError::EmptyPolicy)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
