//! Slotted page implementation.
//!
//! A slotted page uses the following layout:
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ count │ slot0 │ slot1 │ ... │ slotN │   (unused)    │  HEADER_SIZE bytes
//! ├────────────────────────────────────────────────────┤
//! │ [rec0][rec1]...[recN-1]  →                         │
//! │                                                    │
//! │                   Free Space                       │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Payloads are appended in insertion order. Record `i` spans
//! `[slot[i], slot[i + 1])`; the final slot is the end of the last payload.
//! Deletes and resizing updates shift the payloads behind the affected record
//! so the boundaries stay contiguous.

use crate::error::{Result, StorageError};
use crate::page::{PageBuf, PageHeader};
use crate::types::{HEADER_SIZE, MAX_RECORDS, OFFSET_SIZE, PAGE_SIZE};

/// A slotted page providing variable-length record storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlottedPage {
    /// The raw page data
    data: PageBuf,
    /// Cached header (kept in sync with data)
    header: PageHeader,
}

impl SlottedPage {
    /// Create a new empty page
    pub fn new() -> Self {
        let mut data = PageBuf::new();
        let header = PageHeader::new();
        header.write(&mut data);
        Self { data, header }
    }

    /// Load a page from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAGE_SIZE {
            return Err(StorageError::invalid_page(format!(
                "page must be {} bytes, got {}",
                PAGE_SIZE,
                bytes.len()
            )));
        }

        let data = PageBuf::from_bytes(bytes);
        let header = PageHeader::read(&data)
            .ok_or_else(|| StorageError::invalid_page("invalid page header"))?;
        Ok(Self { data, header })
    }

    /// Get the raw bytes of this page
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Get the page header
    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    /// Get the number of records in this page
    pub fn record_count(&self) -> usize {
        self.header.count()
    }

    /// Calculate free space available for new records
    pub fn free_space(&self) -> usize {
        self.header.free_space()
    }

    /// Append a record after the current last record
    ///
    /// Returns the index of the new record. A new record is charged its
    /// payload plus one slot entry against the free space.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<usize> {
        if record.is_empty() {
            return Err(StorageError::EmptyRecord);
        }

        let available = self.free_space();
        let needed = record.len() + OFFSET_SIZE;
        if needed > available {
            return Err(StorageError::InsufficientSpace { needed, available });
        }

        let count = self.record_count();
        if count >= MAX_RECORDS {
            return Err(StorageError::SlotDirectoryFull { max: MAX_RECORDS });
        }

        let offset = self.header.payload_end();
        let end = offset + record.len();
        if end > PAGE_SIZE {
            return Err(StorageError::OffsetOverflow {
                offset,
                len: record.len(),
            });
        }

        self.data[offset..end].copy_from_slice(record);

        self.header.set_slot(count, offset);
        self.header.set_slot(count + 1, end);
        self.header.record_count += 1;
        self.sync_header();

        Ok(count)
    }

    /// Get a copy of the record at the given index
    pub fn get_record(&self, index: usize) -> Result<Vec<u8>> {
        Ok(self.record_slice(index)?.to_vec())
    }

    /// Get copies of all records, in slot order
    pub fn records(&self) -> Result<Vec<Vec<u8>>> {
        (0..self.record_count())
            .map(|i| self.get_record(i))
            .collect()
    }

    /// Delete the record at the given index
    ///
    /// Later records move down one slot and their payloads are shifted over
    /// the vacated bytes, so the space is reclaimed immediately rather than
    /// waiting for `compact_page`. Indices of later records drop by one.
    /// Returns the removed record.
    pub fn delete_record(&mut self, index: usize) -> Result<Vec<u8>> {
        let removed = self.get_record(index)?;
        let payload_end = self.checked_payload_end(index)?;
        let (start, end) = self.header.record_bounds(index);
        let len = end - start;

        self.data.copy_within(end..payload_end, start);

        let count = self.record_count();
        for i in index..count {
            let next = self.header.slot(i + 1);
            self.header.set_slot(i, next - len);
        }
        self.header.set_slot(count, 0);
        self.header.record_count -= 1;
        if self.header.record_count == 0 {
            self.header.set_slot(0, 0);
        }
        self.sync_header();

        Ok(removed)
    }

    /// Replace the record at the given index
    ///
    /// Growing a record requires the extra bytes to fit in the free space.
    /// Records after `index` are shifted to follow the new payload.
    pub fn update_record(&mut self, index: usize, record: &[u8]) -> Result<()> {
        if record.is_empty() {
            return Err(StorageError::EmptyRecord);
        }

        self.record_slice(index)?;
        let payload_end = self.checked_payload_end(index)?;
        let (start, end) = self.header.record_bounds(index);
        let old_len = end - start;
        let new_len = record.len();

        if new_len > old_len {
            let needed = new_len - old_len;
            let available = self.free_space();
            if needed > available {
                return Err(StorageError::InsufficientSpace { needed, available });
            }
        }

        let new_end = start + new_len;
        let tail_len = payload_end - end;
        if new_end + tail_len > PAGE_SIZE {
            return Err(StorageError::OffsetOverflow {
                offset: start,
                len: new_len,
            });
        }

        if new_len != old_len {
            self.data.copy_within(end..payload_end, new_end);
            for i in index + 1..=self.record_count() {
                let slot = self.header.slot(i);
                self.header.set_slot(i, slot - old_len + new_len);
            }
        }
        self.data[start..new_end].copy_from_slice(record);
        self.sync_header();

        Ok(())
    }

    /// Rewrite all records contiguously after the header region
    ///
    /// Recomputes every slot and zeroes any stale bytes left behind the last
    /// payload by earlier deletes or shrinking updates.
    pub fn compact_page(&mut self) -> Result<()> {
        let records = self.records()?;

        let mut compacted = SlottedPage::new();
        for record in &records {
            compacted.insert_record(record)?;
        }

        self.data = compacted.data;
        self.header = compacted.header;

        Ok(())
    }

    /// Find the first record whose leading bytes equal `key`
    pub fn find_record_by_key(&self, key: &[u8]) -> Result<usize> {
        for index in 0..self.record_count() {
            if self.record_slice(index)?.starts_with(key) {
                return Ok(index);
            }
        }
        Err(StorageError::NotFound)
    }

    /// Borrow the payload of a record after validating its boundaries
    fn record_slice(&self, index: usize) -> Result<&[u8]> {
        let count = self.record_count();
        if index >= count {
            return Err(StorageError::InvalidIndex { index, count });
        }

        let (start, end) = self.header.record_bounds(index);
        if start < HEADER_SIZE || start >= end || end > PAGE_SIZE {
            return Err(StorageError::CorruptBoundary { index, start, end });
        }

        Ok(&self.data[start..end])
    }

    /// End of the payload area, after checking that records `from..count`
    /// are well-formed and ordered within it
    ///
    /// Deletes and resizing updates shift every payload behind the affected
    /// record, so each of those boundaries must be valid before bytes move.
    fn checked_payload_end(&self, from: usize) -> Result<usize> {
        let end = self.header.payload_end();
        if end < HEADER_SIZE || end > PAGE_SIZE {
            let index = self.record_count().saturating_sub(1);
            return Err(StorageError::CorruptBoundary {
                index,
                start: self.header.slot(index),
                end,
            });
        }

        for index in from..self.record_count() {
            let (start, record_end) = self.header.record_bounds(index);
            if start < HEADER_SIZE || start >= record_end || record_end > end {
                return Err(StorageError::CorruptBoundary {
                    index,
                    start,
                    end: record_end,
                });
            }
        }
        Ok(end)
    }

    /// Sync the header to the raw page data
    fn sync_header(&mut self) {
        self.header.write(&mut self.data);
    }
}

impl Default for SlottedPage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_new_page() {
        let page = SlottedPage::new();
        assert_eq!(page.record_count(), 0);
        assert_eq!(page.free_space(), PAGE_SIZE - HEADER_SIZE);
        assert!(page.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_hello_world() -> Result<()> {
        let mut page = SlottedPage::new();

        assert_eq!(page.insert_record(b"Hello\0")?, 0);
        assert_eq!(page.insert_record(b"World\0")?, 1);

        assert_eq!(page.record_count(), 2);
        assert_eq!(page.get_record(0)?, b"Hello\0");
        assert_eq!(page.get_record(1)?, b"World\0");
        assert_eq!(page.free_space(), PAGE_SIZE - HEADER_SIZE - 12 - 2 * OFFSET_SIZE);

        // Payloads start right after the header region
        assert_eq!(&page.as_bytes()[HEADER_SIZE..HEADER_SIZE + 12], b"Hello\0World\0");

        Ok(())
    }

    #[test]
    fn test_random_inserts_read_back_in_order() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut page = SlottedPage::new();
        let mut inserted = Vec::new();

        loop {
            let len = rng.gen_range(1..=200);
            if len + OFFSET_SIZE > page.free_space() || inserted.len() == MAX_RECORDS {
                break;
            }
            let record: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            page.insert_record(&record)?;
            inserted.push(record);
        }

        assert_eq!(page.record_count(), inserted.len());
        for (i, record) in inserted.iter().enumerate() {
            assert_eq!(&page.get_record(i)?, record);
        }
        assert_eq!(page.records()?, inserted);

        Ok(())
    }

    #[test]
    fn test_insufficient_space() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(&vec![1u8; 3900])?;
        assert_eq!(page.free_space(), 64);

        match page.insert_record(&[2u8; 65]) {
            Err(StorageError::InsufficientSpace { needed, available }) => {
                assert_eq!(needed, 65 + OFFSET_SIZE);
                assert_eq!(available, 64);
            }
            other => panic!("expected InsufficientSpace, got {:?}", other),
        }
        // Fits once the slot entry is accounted for
        assert!(matches!(
            page.insert_record(&[2u8; 61]),
            Err(StorageError::InsufficientSpace { .. })
        ));
        page.insert_record(&[2u8; 60])?;
        assert_eq!(page.free_space(), 0);
        assert_eq!(page.get_record(1)?, vec![2u8; 60]);

        Ok(())
    }

    #[test]
    fn test_oversized_record_on_empty_page() {
        let mut page = SlottedPage::new();
        let result = page.insert_record(&vec![0u8; PAGE_SIZE]);
        assert!(matches!(result, Err(StorageError::InsufficientSpace { .. })));
        assert_eq!(page.record_count(), 0);
    }

    #[test]
    fn test_slot_directory_full() -> Result<()> {
        let mut page = SlottedPage::new();
        for i in 0..MAX_RECORDS {
            page.insert_record(&[i as u8])?;
        }

        let result = page.insert_record(b"x");
        assert!(matches!(
            result,
            Err(StorageError::SlotDirectoryFull { max: MAX_RECORDS })
        ));
        assert_eq!(page.get_record(MAX_RECORDS - 1)?, vec![(MAX_RECORDS - 1) as u8]);

        Ok(())
    }

    #[test]
    fn test_empty_record_rejected() {
        let mut page = SlottedPage::new();
        assert!(matches!(page.insert_record(b""), Err(StorageError::EmptyRecord)));
    }

    #[test]
    fn test_invalid_index() -> Result<()> {
        let mut page = SlottedPage::new();
        assert!(matches!(
            page.get_record(0),
            Err(StorageError::InvalidIndex { index: 0, count: 0 })
        ));

        page.insert_record(b"a")?;
        assert!(matches!(
            page.get_record(1),
            Err(StorageError::InvalidIndex { index: 1, count: 1 })
        ));
        assert!(matches!(
            page.delete_record(5),
            Err(StorageError::InvalidIndex { .. })
        ));
        assert!(matches!(
            page.update_record(1, b"b"),
            Err(StorageError::InvalidIndex { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_corrupt_boundary() -> Result<()> {
        let mut bytes = vec![0u8; PAGE_SIZE];
        let mut header = PageHeader::new();
        header.record_count = 2;
        header.set_slot(0, 200);
        header.set_slot(1, 150);
        header.set_slot(2, PAGE_SIZE + 10);
        header.write(&mut bytes);

        let page = SlottedPage::from_bytes(&bytes)?;
        assert!(matches!(
            page.get_record(0),
            Err(StorageError::CorruptBoundary {
                index: 0,
                start: 200,
                end: 150
            })
        ));
        assert!(matches!(
            page.get_record(1),
            Err(StorageError::CorruptBoundary { index: 1, .. })
        ));

        Ok(())
    }

    #[test]
    fn test_shifting_ops_reject_disordered_slots() -> Result<()> {
        // Record 0 claims to end past the payload end recorded in slot 2
        let mut bytes = vec![0u8; PAGE_SIZE];
        let mut header = PageHeader::new();
        header.record_count = 2;
        header.set_slot(0, HEADER_SIZE);
        header.set_slot(1, 200);
        header.set_slot(2, 150);
        header.write(&mut bytes);

        let mut page = SlottedPage::from_bytes(&bytes)?;
        let before = page.clone();

        assert!(matches!(
            page.delete_record(0),
            Err(StorageError::CorruptBoundary {
                index: 0,
                start: HEADER_SIZE,
                end: 200
            })
        ));
        assert!(matches!(
            page.update_record(0, b"x"),
            Err(StorageError::CorruptBoundary { index: 0, .. })
        ));
        assert!(matches!(
            page.update_record(0, &[7u8; 100]),
            Err(StorageError::CorruptBoundary { index: 0, .. })
        ));
        assert!(matches!(
            page.delete_record(1),
            Err(StorageError::CorruptBoundary { index: 1, .. })
        ));
        assert_eq!(page, before);

        Ok(())
    }

    #[test]
    fn test_delete_middle() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(b"alpha")?;
        page.insert_record(b"bb")?;
        page.insert_record(b"gamma!")?;
        let before = page.free_space();

        let removed = page.delete_record(1)?;
        assert_eq!(removed, b"bb");
        assert_eq!(page.record_count(), 2);
        assert_eq!(page.get_record(0)?, b"alpha");
        assert_eq!(page.get_record(1)?, b"gamma!");
        assert_eq!(page.free_space(), before + 2 + OFFSET_SIZE);

        // Appends continue right after the shifted payloads
        page.insert_record(b"z")?;
        assert_eq!(page.get_record(2)?, b"z");
        assert_eq!(page.header().payload_end(), HEADER_SIZE + 5 + 6 + 1);

        Ok(())
    }

    #[test]
    fn test_delete_first_and_last() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(b"one")?;
        page.insert_record(b"two")?;
        page.insert_record(b"three")?;

        page.delete_record(2)?;
        page.delete_record(0)?;
        assert_eq!(page.records()?, vec![b"two".to_vec()]);

        page.delete_record(0)?;
        assert_eq!(page.record_count(), 0);
        assert_eq!(page.free_space(), PAGE_SIZE - HEADER_SIZE);

        Ok(())
    }

    #[test]
    fn test_update_same_length_in_place() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(b"aaaa")?;
        page.insert_record(b"bbbb")?;
        let free = page.free_space();

        page.update_record(0, b"cccc")?;
        assert_eq!(page.records()?, vec![b"cccc".to_vec(), b"bbbb".to_vec()]);
        assert_eq!(page.free_space(), free);

        Ok(())
    }

    #[test]
    fn test_update_shrink_and_grow() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(b"first")?;
        page.insert_record(b"second")?;
        page.insert_record(b"third")?;

        page.update_record(1, b"2")?;
        assert_eq!(
            page.records()?,
            vec![b"first".to_vec(), b"2".to_vec(), b"third".to_vec()]
        );

        page.update_record(0, b"the first record")?;
        assert_eq!(
            page.records()?,
            vec![b"the first record".to_vec(), b"2".to_vec(), b"third".to_vec()]
        );

        Ok(())
    }

    #[test]
    fn test_update_growth_beyond_free_space() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(b"small")?;
        page.insert_record(&vec![9u8; 3900])?;
        let free = page.free_space();

        let result = page.update_record(0, &vec![1u8; 5 + free + 1]);
        assert!(matches!(result, Err(StorageError::InsufficientSpace { .. })));
        // Failed update leaves the page untouched
        assert_eq!(page.get_record(0)?, b"small");
        assert_eq!(page.get_record(1)?, vec![9u8; 3900]);

        page.update_record(0, &vec![1u8; 5 + free])?;
        assert_eq!(page.free_space(), 0);
        assert_eq!(page.get_record(1)?, vec![9u8; 3900]);

        Ok(())
    }

    #[test]
    fn test_compact_page_clears_stale_bytes() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(b"keep")?;
        page.insert_record(b"drop-me")?;
        page.insert_record(b"tail")?;
        page.delete_record(1)?;

        let end = page.header().payload_end();
        assert!(page.as_bytes()[end..].iter().any(|&b| b != 0));

        page.compact_page()?;
        assert_eq!(page.records()?, vec![b"keep".to_vec(), b"tail".to_vec()]);
        assert_eq!(page.header().slot(0), HEADER_SIZE);
        assert!(page.as_bytes()[end..].iter().all(|&b| b == 0));

        Ok(())
    }

    #[test]
    fn test_find_record_by_key() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(b"user:1|alice")?;
        page.insert_record(b"user:2|bob")?;
        page.insert_record(b"us")?;

        assert_eq!(page.find_record_by_key(b"user:2")?, 1);
        assert_eq!(page.find_record_by_key(b"user:1|alice")?, 0);
        assert!(matches!(
            page.find_record_by_key(b"user:3"),
            Err(StorageError::NotFound)
        ));
        // Key longer than a record never matches it
        assert!(matches!(
            page.find_record_by_key(b"user:2|bobby"),
            Err(StorageError::NotFound)
        ));

        Ok(())
    }

    #[test]
    fn test_from_bytes_roundtrip() -> Result<()> {
        let mut page = SlottedPage::new();
        page.insert_record(b"test")?;
        page.insert_record(b"data")?;

        let restored = SlottedPage::from_bytes(page.as_bytes())?;
        assert_eq!(restored, page);
        assert_eq!(restored.get_record(1)?, b"data");

        Ok(())
    }

    #[test]
    fn test_from_bytes_wrong_length() {
        let result = SlottedPage::from_bytes(&[0u8; 100]);
        assert!(matches!(result, Err(StorageError::InvalidPage(_))));
    }
}
