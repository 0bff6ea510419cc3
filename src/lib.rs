//! # Page Cache
//!
//! A single-file storage engine core: a bounded buffer pool over a
//! page-addressable file, holding slotted pages of variable-length records.
//!
//! ## Architecture
//!
//! The engine is composed of modular, swappable components:
//!
//! - **Page Layer** (`page`): Slotted record pages with an in-band slot directory
//! - **Storage Layer** (`storage`): Page-granular file I/O behind a trait
//! - **Buffer Pool** (`buffer`): Bounded page cache with dirty tracking and
//!   LRU, FIFO or Clock eviction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecache::{Config, Db, PageId, PolicyKind};
//!
//! let config = Config::new("data/database.bin").capacity(3).policy(PolicyKind::Clock);
//! let db = Db::open(config)?;
//!
//! let index = db.insert_record(PageId::new(0), b"Hello\0")?;
//! let record = db.read_record(PageId::new(0), index)?;
//!
//! db.flush()?;
//! ```

pub mod buffer;
pub mod error;
pub mod page;
pub mod storage;
pub mod types;

pub use error::{Result, StorageError};
pub use types::{PageId, HEADER_SIZE, PAGE_SIZE};

// Re-export main public API
pub use buffer::{BufferPool, PolicyKind, PoolStats, ReplacementPolicy};
pub use page::SlottedPage;
pub use storage::{FilePageStore, MemoryPageStore, PageStore};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of frames in the buffer pool
pub const DEFAULT_CAPACITY: usize = 64;

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// Page cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the backing file
    pub path: PathBuf,
    /// Buffer pool size in number of pages (default: 64)
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Replacement policy (default: lru)
    #[serde(default)]
    pub policy: PolicyKind,
    /// Whether to sync writes immediately (default: false for performance)
    #[serde(default)]
    pub sync_on_write: bool,
}

impl Config {
    /// Create a new configuration with default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            capacity: DEFAULT_CAPACITY,
            policy: PolicyKind::default(),
            sync_on_write: false,
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| StorageError::invalid_config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set buffer pool size
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set replacement policy
    pub fn policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Enable sync on write for durability
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }

    /// Check that the configuration can back a buffer pool
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(StorageError::invalid_config(
                "capacity must be at least 1 page",
            ));
        }
        Ok(())
    }
}

/// Shared handle to a file-backed buffer pool
///
/// All access goes through one mutex, so the handle can be shared across
/// threads. Page contents are only reachable inside the closures passed to
/// `with_page` and `with_page_mut`, which run under the lock.
pub struct Db {
    pool: Mutex<BufferPool>,
    config: Config,
}

impl Db {
    /// Open or create the backing file and build an empty pool over it
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let store = FilePageStore::open(&config.path, config.sync_on_write)?;
        let pool = BufferPool::new(Box::new(store), config.capacity, config.policy)?;

        log::info!(
            "opened {} (capacity {}, {} policy)",
            config.path.display(),
            config.capacity,
            config.policy
        );

        Ok(Self {
            pool: Mutex::new(pool),
            config,
        })
    }

    /// Get the configuration this handle was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `f` against a page, loading it if necessary
    pub fn with_page<R>(&self, page_id: PageId, f: impl FnOnce(&SlottedPage) -> R) -> Result<R> {
        let mut pool = self.pool.lock();
        let page = pool.fetch_page(page_id)?;
        Ok(f(page))
    }

    /// Run `f` against a page for modification; the page is marked dirty
    pub fn with_page_mut<R>(
        &self,
        page_id: PageId,
        f: impl FnOnce(&mut SlottedPage) -> Result<R>,
    ) -> Result<R> {
        let mut pool = self.pool.lock();
        let page = pool.fetch_page_mut(page_id)?;
        f(page)
    }

    /// Read one record
    pub fn read_record(&self, page_id: PageId, index: usize) -> Result<Vec<u8>> {
        self.with_page(page_id, |page| page.get_record(index))?
    }

    /// Append a record to a page
    ///
    /// A page past the end of the file starts out empty. Returns the record's
    /// index within the page.
    pub fn insert_record(&self, page_id: PageId, record: &[u8]) -> Result<usize> {
        let mut pool = self.pool.lock();
        match pool.fetch_page_mut(page_id) {
            Ok(page) => return page.insert_record(record),
            Err(StorageError::ShortRead { .. }) => {}
            Err(e) => return Err(e),
        }

        let mut page = SlottedPage::new();
        let index = page.insert_record(record)?;
        pool.write_page(page_id, page)?;
        Ok(index)
    }

    /// Replace a page's cached contents
    pub fn write_page(&self, page_id: PageId, page: SlottedPage) -> Result<()> {
        self.pool.lock().write_page(page_id, page)
    }

    /// Write all dirty pages and empty the pool
    pub fn flush(&self) -> Result<()> {
        self.pool.lock().flush_all()
    }

    /// Get pool activity counters
    pub fn stats(&self) -> PoolStats {
        self.pool.lock().stats()
    }

    /// Number of pages currently in the backing file
    pub fn page_count(&self) -> Result<u32> {
        self.pool.lock().store().page_count()
    }
}
