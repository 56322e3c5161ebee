//! # Heap Relation Files
//!
//! The base relation an index is built over: a file of fixed-width
//! records addressed by `(page, slot)` record ids. The index's bulk load
//! scans this file and inserts each record's key; tests use it to stage
//! relations.
//!
//! ## File Layout
//!
//! ```text
//! Page 0:   HeapFileHeader (magic, version, record_len, record_count)
//! Page 1+:  data pages, a PageHeader (entry_count) followed by records
//!           packed at fixed slots
//! ```
//!
//! Records never span pages; a page holds `PAGE_USABLE_SIZE / record_len`
//! of them. Appends fill the last page before allocating the next, so
//! record ids are dense and `(page 1, slot 0)` is the first record.
//!
//! The scanner yields `(record bytes, record id)` pairs in append order
//! and simply runs out at the end of the file.

use std::path::Path;
use std::sync::Arc;

use eyre::{ensure, Result};
use zerocopy::IntoBytes;

use crate::config::{FILE_HEADER_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE, PAGE_USABLE_SIZE};
use crate::storage::{HeapFileHeader, PageHeader, PageType, PagedFile};
use crate::types::RecordId;

pub struct HeapFile {
    file: Arc<PagedFile>,
    record_len: usize,
    record_count: u64,
    records_per_page: usize,
}

impl HeapFile {
    pub fn create<P: AsRef<Path>>(path: P, record_len: usize) -> Result<Self> {
        ensure!(
            record_len > 0 && record_len <= PAGE_USABLE_SIZE,
            "record length {} must be between 1 and {}",
            record_len,
            PAGE_USABLE_SIZE
        );

        let file = Arc::new(PagedFile::create(path)?);
        let page_no = file.allocate_page()?;
        ensure!(page_no == 0, "heap header must land on page 0");

        let mut page = vec![0u8; PAGE_SIZE];
        let header = HeapFileHeader::new(record_len as u32);
        page[..FILE_HEADER_SIZE].copy_from_slice(header.as_bytes());
        file.write_page(0, &page)?;

        Ok(Self {
            file,
            record_len,
            record_count: 0,
            records_per_page: PAGE_USABLE_SIZE / record_len,
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = Arc::new(PagedFile::open(path)?);

        let mut page = vec![0u8; PAGE_SIZE];
        file.read_page(0, &mut page)?;
        let header = HeapFileHeader::from_bytes(&page)?;
        let record_len = header.record_len() as usize;
        ensure!(
            record_len > 0 && record_len <= PAGE_USABLE_SIZE,
            "heap header carries invalid record length {}",
            record_len
        );

        Ok(Self {
            record_count: header.record_count(),
            records_per_page: PAGE_USABLE_SIZE / record_len,
            record_len,
            file,
        })
    }

    pub fn record_len(&self) -> usize {
        self.record_len
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Appends one record and returns its id. Pages fill in order, so ids
    /// are dense.
    pub fn append(&mut self, record: &[u8]) -> Result<RecordId> {
        ensure!(
            record.len() == self.record_len,
            "record is {} bytes, this heap stores {}-byte records",
            record.len(),
            self.record_len
        );

        let slot = (self.record_count % self.records_per_page as u64) as usize;
        let page_no = 1 + (self.record_count / self.records_per_page as u64) as u32;

        let mut page = vec![0u8; PAGE_SIZE];
        if slot == 0 {
            let allocated = self.file.allocate_page()?;
            ensure!(allocated == page_no, "heap pages must be appended in order");
            PageHeader::new(PageType::HeapData).write_to(&mut page)?;
        } else {
            self.file.read_page(page_no, &mut page)?;
        }

        let offset = PAGE_HEADER_SIZE + slot * self.record_len;
        page[offset..offset + self.record_len].copy_from_slice(record);

        let header = PageHeader::from_bytes_mut(&mut page)?;
        header.set_entry_count(slot as u16 + 1);
        self.file.write_page(page_no, &page)?;

        self.record_count += 1;
        Ok(RecordId::new(page_no, slot as u16))
    }

    /// Persists the record count to the file header and fsyncs.
    pub fn sync(&self) -> Result<()> {
        let mut page = vec![0u8; PAGE_SIZE];
        self.file.read_page(0, &mut page)?;

        let header = HeapFileHeader::from_bytes_mut(&mut page)?;
        header.set_record_count(self.record_count);
        self.file.write_page(0, &page)?;

        self.file.sync()
    }

    /// Iterates every record in append order.
    pub fn scan(&self) -> HeapScan<'_> {
        HeapScan {
            heap: self,
            page_no: 1,
            slot: 0,
            page: None,
        }
    }
}

impl Drop for HeapFile {
    fn drop(&mut self) {
        let _ = self.sync();
    }
}

/// Streaming reader over a heap file. Yields owned record bytes so no
/// page buffer outlives a single `next` call.
pub struct HeapScan<'a> {
    heap: &'a HeapFile,
    page_no: u32,
    slot: usize,
    page: Option<Vec<u8>>,
}

impl Iterator for HeapScan<'_> {
    type Item = Result<(Vec<u8>, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.page_no >= self.heap.file.page_count() {
                return None;
            }

            if self.page.is_none() {
                let mut buf = vec![0u8; PAGE_SIZE];
                if let Err(e) = self.heap.file.read_page(self.page_no, &mut buf) {
                    return Some(Err(e));
                }
                self.page = Some(buf);
            }
            let page = self.page.as_ref().unwrap(); // INVARIANT: loaded above

            let count = match PageHeader::from_bytes(page) {
                Ok(header) => header.entry_count() as usize,
                Err(e) => return Some(Err(e)),
            };

            if self.slot >= count {
                self.page = None;
                self.page_no += 1;
                self.slot = 0;
                continue;
            }

            let offset = PAGE_HEADER_SIZE + self.slot * self.heap.record_len;
            let record = page[offset..offset + self.heap.record_len].to_vec();
            let rid = RecordId::new(self.page_no, self.slot as u16);
            self.slot += 1;

            return Some(Ok((record, rid)));
        }
    }
}
