//! LRU (Least Recently Used) replacement policy.

use crate::buffer::policy::ReplacementPolicy;
use crate::error::{Result, StorageError};
use crate::types::PageId;
use std::collections::HashMap;

/// Tracks page recency with an index-linked list for O(1) updates
pub struct LruReplacer {
    /// Maps page ID to its node in `order`
    positions: HashMap<PageId, usize>,
    /// Doubly-linked list nodes for O(1) removal
    order: Vec<LruNode>,
    /// Head of the list (most recently used)
    head: Option<usize>,
    /// Tail of the list (least recently used)
    tail: Option<usize>,
    /// Free list of node indices
    free_slots: Vec<usize>,
}

#[derive(Clone, Copy)]
struct LruNode {
    page_id: PageId,
    prev: Option<usize>,
    next: Option<usize>,
}

impl LruReplacer {
    /// Create a new LRU replacer sized for `capacity` pages
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_slots: Vec::new(),
        }
    }

    /// Get the least recently used page ID without removing it
    pub fn lru(&self) -> Option<PageId> {
        self.tail.map(|pos| self.order[pos].page_id)
    }

    /// Remove a page from tracking
    fn remove(&mut self, page_id: PageId) {
        if let Some(pos) = self.positions.remove(&page_id) {
            self.unlink(pos);
            self.free_slots.push(pos);
        }
    }

    /// Insert a new page at the front
    fn insert(&mut self, page_id: PageId) {
        let node = LruNode {
            page_id,
            prev: None,
            next: self.head,
        };
        let pos = if let Some(pos) = self.free_slots.pop() {
            self.order[pos] = node;
            pos
        } else {
            self.order.push(node);
            self.order.len() - 1
        };

        if let Some(old_head) = self.head {
            self.order[old_head].prev = Some(pos);
        }
        self.head = Some(pos);

        if self.tail.is_none() {
            self.tail = Some(pos);
        }

        self.positions.insert(page_id, pos);
    }

    /// Move a node to the front of the list
    fn move_to_front(&mut self, pos: usize) {
        if self.head == Some(pos) {
            return;
        }

        self.unlink(pos);

        self.order[pos].prev = None;
        self.order[pos].next = self.head;

        if let Some(old_head) = self.head {
            self.order[old_head].prev = Some(pos);
        }
        self.head = Some(pos);

        if self.tail.is_none() {
            self.tail = Some(pos);
        }
    }

    /// Unlink a node from the list
    fn unlink(&mut self, pos: usize) {
        let node = self.order[pos];

        if let Some(prev) = node.prev {
            self.order[prev].next = node.next;
        } else {
            self.head = node.next;
        }

        if let Some(next) = node.next {
            self.order[next].prev = node.prev;
        } else {
            self.tail = node.prev;
        }
    }
}

impl ReplacementPolicy for LruReplacer {
    /// Move a tracked page to the most-recently-used end; untracked pages are
    /// ignored
    fn access(&mut self, page_id: PageId) {
        if let Some(&pos) = self.positions.get(&page_id) {
            self.move_to_front(pos);
        }
    }

    fn add_page(&mut self, page_id: PageId) {
        match self.positions.get(&page_id) {
            Some(&pos) => self.move_to_front(pos),
            None => self.insert(page_id),
        }
    }

    fn evict(&mut self) -> Result<PageId> {
        let page_id = self.lru().ok_or(StorageError::EmptyPolicy)?;
        self.remove(page_id);
        Ok(page_id)
    }

    fn len(&self) -> usize {
        self.positions.len()
    }
}
