//! Buffer pool implementation.
//!
//! The buffer pool holds at most `capacity` frames, caching pages read from
//! the page store and writing dirty pages back lazily on eviction or flush.
//!
//! Page references returned by the pool borrow it, so they cannot be held
//! across a call that might evict the page.

use crate::buffer::{PolicyKind, ReplacementPolicy, Replacer};
use crate::error::{Result, StorageError};
use crate::page::SlottedPage;
use crate::storage::PageStore;
use crate::types::PageId;
use serde::Serialize;
use std::collections::HashMap;

/// A frame in the buffer pool
struct BufferFrame {
    /// The page data
    page: SlottedPage,
    /// Whether the page differs from the copy in the page store
    dirty: bool,
}

impl BufferFrame {
    fn new(page: SlottedPage, dirty: bool) -> Self {
        Self { page, dirty }
    }
}

/// Counters describing pool activity since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Fetches served from a resident frame
    pub hits: u64,
    /// Fetches that had to read from the page store
    pub misses: u64,
    /// Frames evicted to make room
    pub evictions: u64,
    /// Dirty pages written back to the page store
    pub write_backs: u64,
}

/// Buffer pool implementation
pub struct BufferPool {
    /// The page store for I/O
    store: Box<dyn PageStore>,
    /// Cached frames indexed by page ID
    frames: HashMap<PageId, BufferFrame>,
    /// Replacement policy mirroring the keys of `frames`
    policy: Replacer,
    /// Maximum number of frames
    capacity: usize,
    stats: PoolStats,
}

impl BufferPool {
    /// Create a new, empty buffer pool
    pub fn new(store: Box<dyn PageStore>, capacity: usize, policy: PolicyKind) -> Result<Self> {
        if capacity == 0 {
            return Err(StorageError::invalid_config(
                "buffer pool capacity must be at least 1",
            ));
        }

        Ok(Self {
            store,
            frames: HashMap::with_capacity(capacity),
            policy: Replacer::new(policy, capacity),
            capacity,
            stats: PoolStats::default(),
        })
    }

    /// Fetch a page, loading it from the page store on a miss
    ///
    /// A newly loaded frame starts clean.
    pub fn fetch_page(&mut self, page_id: PageId) -> Result<&SlottedPage> {
        let frame = self.get_frame(page_id)?;
        Ok(&frame.page)
    }

    /// Fetch a page for in-place modification
    ///
    /// The frame is marked dirty, so edits made through the returned
    /// reference reach the page store on eviction or flush.
    pub fn fetch_page_mut(&mut self, page_id: PageId) -> Result<&mut SlottedPage> {
        let frame = self.get_frame(page_id)?;
        frame.dirty = true;
        Ok(&mut frame.page)
    }

    /// Replace the cached contents of a page
    ///
    /// No I/O happens until the page is evicted or flushed.
    pub fn write_page(&mut self, page_id: PageId, page: SlottedPage) -> Result<()> {
        if let Some(frame) = self.frames.get_mut(&page_id) {
            frame.page = page;
            frame.dirty = true;
            self.policy.access(page_id);
            return Ok(());
        }

        if self.frames.len() >= self.capacity {
            self.evict_one()?;
        }

        self.frames.insert(page_id, BufferFrame::new(page, true));
        self.policy.add_page(page_id);
        log::trace!("buffered write of page {}", page_id);
        Ok(())
    }

    /// Write one page back if it is dirty, keeping it resident
    pub fn flush_page(&mut self, page_id: PageId) -> Result<()> {
        if let Some(frame) = self.frames.get_mut(&page_id) {
            if frame.dirty {
                self.store.write_page(page_id, &frame.page)?;
                frame.dirty = false;
                self.stats.write_backs += 1;
            }
        }
        Ok(())
    }

    /// Write every dirty page back, then drop all frames
    ///
    /// Pages are written in ascending page order. The replacement policy is
    /// reset along with the frames.
    pub fn flush_all(&mut self) -> Result<()> {
        let mut page_ids: Vec<PageId> = self.frames.keys().copied().collect();
        page_ids.sort_unstable();

        for page_id in page_ids {
            self.flush_page(page_id)?;
        }
        self.store.sync()?;

        log::debug!("flushed and dropped {} frames", self.frames.len());
        self.frames.clear();
        self.policy = Replacer::new(self.policy.kind(), self.capacity);
        Ok(())
    }

    /// Check whether a page is resident
    pub fn contains(&self, page_id: PageId) -> bool {
        self.frames.contains_key(&page_id)
    }

    /// Dirty flag of a resident page, or `None` if it is not resident
    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.frames.get(&page_id).map(|frame| frame.dirty)
    }

    /// Resident page IDs in ascending order
    pub fn resident_pages(&self) -> Vec<PageId> {
        let mut page_ids: Vec<PageId> = self.frames.keys().copied().collect();
        page_ids.sort_unstable();
        page_ids
    }

    /// Number of resident frames
    pub fn resident_count(&self) -> usize {
        self.frames.len()
    }

    /// Get the buffer pool capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Replacement policy in use
    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Activity counters
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// The underlying page store
    pub fn store(&self) -> &dyn PageStore {
        self.store.as_ref()
    }

    /// Get or load the frame for a page
    fn get_frame(&mut self, page_id: PageId) -> Result<&mut BufferFrame> {
        if self.frames.contains_key(&page_id) {
            self.policy.access(page_id);
            self.stats.hits += 1;
            log::trace!("hit page {}", page_id);
        } else {
            self.load_page(page_id)?;
        }

        self.frames
            .get_mut(&page_id)
            .ok_or(StorageError::PageNotResident(page_id))
    }

    /// Load a page from the page store into a new clean frame
    fn load_page(&mut self, page_id: PageId) -> Result<()> {
        self.stats.misses += 1;

        if self.frames.len() >= self.capacity {
            self.evict_one()?;
        }

        let page = self.store.read_page(page_id)?;
        self.frames.insert(page_id, BufferFrame::new(page, false));
        self.policy.add_page(page_id);
        log::debug!("loaded page {}", page_id);
        Ok(())
    }

    /// Evict one page chosen by the policy, writing it back if dirty
    fn evict_one(&mut self) -> Result<()> {
        if self.frames.is_empty() {
            return Err(StorageError::EmptyBuffer);
        }

        let victim = self.policy.evict()?;
        let frame = self
            .frames
            .get(&victim)
            .ok_or(StorageError::EvictionTargetMissing(victim))?;

        if frame.dirty {
            if let Err(e) = self.store.write_page(victim, &frame.page) {
                log::warn!("write-back of page {} failed: {}", victim, e);
                // Keep policy and frames in agreement; the page stays resident
                self.policy.add_page(victim);
                return Err(e);
            }
            self.stats.write_backs += 1;
        }

        self.frames.remove(&victim);
        self.stats.evictions += 1;
        log::debug!("evicted page {} ({} policy)", victim, self.policy.kind());
        Ok(())
    }
}
