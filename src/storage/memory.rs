//! In-memory page store.
//!
//! Behaves like a file that grows on write: pages between the old end and a
//! newly written page read back as zeros, pages past the end fail with
//! `ShortRead`.

use crate::error::{Result, StorageError};
use crate::page::{PageBuf, SlottedPage};
use crate::storage::PageStore;
use crate::types::PageId;
use parking_lot::RwLock;

/// Page store backed by a growable vector of page buffers
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: RwLock<Vec<PageBuf>>,
}

impl MemoryPageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `count` zeroed pages
    pub fn with_pages(count: u32) -> Self {
        Self {
            pages: RwLock::new(vec![PageBuf::new(); count as usize]),
        }
    }
}

impl PageStore for MemoryPageStore {
    fn read_page(&self, page_id: PageId) -> Result<SlottedPage> {
        let pages = self.pages.read();
        match pages.get(page_id.value() as usize) {
            Some(buf) => SlottedPage::from_bytes(buf.as_bytes()),
            None => Err(StorageError::ShortRead { page_id, read: 0 }),
        }
    }

    fn write_page(&self, page_id: PageId, page: &SlottedPage) -> Result<()> {
        let index = page_id.value() as usize;
        let mut pages = self.pages.write();
        if pages.len() <= index {
            pages.resize(index + 1, PageBuf::new());
        }
        pages[index] = PageBuf::from_bytes(page.as_bytes());
        Ok(())
    }

    fn page_count(&self) -> Result<u32> {
        Ok(self.pages.read().len() as u32)
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}
