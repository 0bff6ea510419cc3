//! File-backed page store.
//!
//! The page store is responsible for reading and writing whole pages to the
//! backing file. It abstracts the file I/O operations behind a trait so that
//! the buffer pool can be tested against an in-memory implementation.

use crate::error::{Result, StorageError};
use crate::page::SlottedPage;
use crate::types::{PageId, PAGE_SIZE};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Trait for page-granular I/O
pub trait PageStore: Send + Sync {
    /// Read a full page
    ///
    /// Fails with `ShortRead` if the store holds fewer than `PAGE_SIZE` bytes
    /// at the page's position.
    fn read_page(&self, page_id: PageId) -> Result<SlottedPage>;

    /// Write a full page in place
    fn write_page(&self, page_id: PageId, page: &SlottedPage) -> Result<()>;

    /// Number of whole pages currently held by the store
    fn page_count(&self) -> Result<u32>;

    /// Sync all data to durable storage
    fn sync(&self) -> Result<()>;
}

/// File-based page store implementation
///
/// The file handle is opened once and held until the store is dropped.
pub struct FilePageStore {
    /// The backing file, opened for reading and writing
    file: Mutex<File>,
    /// Path the store was opened from
    path: PathBuf,
    /// Whether to sync on each write
    sync_on_write: bool,
}

impl FilePageStore {
    /// Open or create a backing file
    ///
    /// Existing contents are preserved.
    pub fn open(path: &Path, sync_on_write: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        log::debug!(
            "opened page store {} ({} bytes)",
            path.display(),
            file.metadata()?.len()
        );

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            sync_on_write,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageStore for FilePageStore {
    fn read_page(&self, page_id: PageId) -> Result<SlottedPage> {
        let offset = page_id.file_offset(PAGE_SIZE);
        let mut buf = vec![0u8; PAGE_SIZE];

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut read = 0;
        while read < PAGE_SIZE {
            match file.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        drop(file);

        if read < PAGE_SIZE {
            return Err(StorageError::ShortRead { page_id, read });
        }

        log::trace!("read page {} from {}", page_id, self.path.display());
        SlottedPage::from_bytes(&buf)
    }

    fn write_page(&self, page_id: PageId, page: &SlottedPage) -> Result<()> {
        let offset = page_id.file_offset(PAGE_SIZE);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.as_bytes())?;

        if self.sync_on_write {
            file.sync_data()?;
        }

        log::trace!("wrote page {} to {}", page_id, self.path.display());
        Ok(())
    }

    fn page_count(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    fn sync(&self) -> Result<()> {
        let file = self.file.lock();
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_roundtrip() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = FilePageStore::open(&path, false)?;

        let mut page = SlottedPage::new();
        page.insert_record(b"Hello\0")?;
        page.insert_record(b"World\0")?;
        store.write_page(PageId::new(0), &page)?;

        let read_back = store.read_page(PageId::new(0))?;
        assert_eq!(read_back.as_bytes(), page.as_bytes());
        assert_eq!(store.page_count()?, 1);

        Ok(())
    }

    #[test]
    fn test_read_past_end_is_short_read() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = FilePageStore::open(&path, false)?;

        match store.read_page(PageId::new(0)) {
            Err(StorageError::ShortRead { page_id, read }) => {
                assert_eq!(page_id, PageId::new(0));
                assert_eq!(read, 0);
            }
            other => panic!("expected ShortRead, got {:?}", other.map(|_| ())),
        }

        Ok(())
    }

    #[test]
    fn test_partial_page_is_short_read() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        std::fs::write(&path, vec![0u8; PAGE_SIZE + 100])?;

        let store = FilePageStore::open(&path, false)?;
        assert!(store.read_page(PageId::new(0)).is_ok());
        assert!(matches!(
            store.read_page(PageId::new(1)),
            Err(StorageError::ShortRead { read: 100, .. })
        ));

        Ok(())
    }

    #[test]
    fn test_sparse_write_zero_fills_gap() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = FilePageStore::open(&path, false)?;

        let mut page = SlottedPage::new();
        page.insert_record(b"far away")?;
        store.write_page(PageId::new(3), &page)?;

        assert_eq!(store.page_count()?, 4);
        let gap = store.read_page(PageId::new(1))?;
        assert_eq!(gap.record_count(), 0);
        assert!(gap.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(store.read_page(PageId::new(3))?.get_record(0)?, b"far away");

        Ok(())
    }

    #[test]
    fn test_overwrite_in_place() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = FilePageStore::open(&path, true)?;

        for i in 0..3u8 {
            let mut page = SlottedPage::new();
            page.insert_record(&[b'a' + i])?;
            store.write_page(PageId::new(i as u32), &page)?;
        }

        let mut replacement = SlottedPage::new();
        replacement.insert_record(b"B")?;
        store.write_page(PageId::new(1), &replacement)?;

        assert_eq!(store.page_count()?, 3);
        assert_eq!(store.read_page(PageId::new(0))?.get_record(0)?, b"a");
        assert_eq!(store.read_page(PageId::new(1))?.get_record(0)?, b"B");
        assert_eq!(store.read_page(PageId::new(2))?.get_record(0)?, b"c");

        Ok(())
    }

    #[test]
    fn test_reopen_preserves_pages() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let store = FilePageStore::open(&path, false)?;
            let mut page = SlottedPage::new();
            page.insert_record(b"persist")?;
            store.write_page(PageId::new(0), &page)?;
            store.sync()?;
        }

        {
            let store = FilePageStore::open(&path, false)?;
            assert_eq!(store.page_count()?, 1);
            assert_eq!(store.read_page(PageId::new(0))?.get_record(0)?, b"persist");
        }

        Ok(())
    }
}
