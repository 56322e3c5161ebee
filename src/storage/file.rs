//! # Paged File I/O
//!
//! `PagedFile` is the disk-facing half of the storage layer: a plain file
//! read and written in whole 8KB pages through positional I/O. It carries
//! no cache of its own: the buffer pool owns the page buffers and decides
//! when a page touches disk, so this type stays a thin, stateless conduit.
//!
//! ## File Format
//!
//! Files are concatenated pages:
//!
//! ```text
//! Offset 0:       Page 0 (file header, see storage::headers)
//! Offset 8192:    Page 1
//! Offset 16384:   Page 2
//! ...
//! ```
//!
//! The file size is always a multiple of the page size; `open` rejects
//! anything else as truncation damage.
//!
//! ## File Identity
//!
//! Each open `PagedFile` receives a process-unique `file_id` so one buffer
//! pool can cache pages from several files (an index and the heap relation
//! it was bulk-loaded from) without key collisions.
//!
//! ## Error Handling
//!
//! All fallible operations return `eyre::Result` with the file path and
//! page number in context.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use eyre::{ensure, Result, WrapErr};

use crate::config::PAGE_SIZE;

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct PagedFile {
    file: File,
    path: PathBuf,
    file_id: u64,
    page_count: AtomicU32,
}

impl PagedFile {
    /// Creates a new empty file. Fails if the path already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .wrap_err_with(|| format!("failed to create file '{}'", path.display()))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            file_id: NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed),
            page_count: AtomicU32::new(0),
        })
    }

    /// Opens an existing file. The size must be a whole number of pages.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .wrap_err_with(|| format!("failed to open file '{}'", path.display()))?;

        let metadata = file
            .metadata()
            .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?;

        let file_size = metadata.len();

        ensure!(
            file_size > 0,
            "cannot open empty file '{}'",
            path.display()
        );

        ensure!(
            file_size % PAGE_SIZE as u64 == 0,
            "file '{}' size {} is not a multiple of page size {}",
            path.display(),
            file_size,
            PAGE_SIZE
        );

        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            file_id: NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed),
            page_count: AtomicU32::new(page_count),
        })
    }

    pub fn read_page(&self, page_no: u32, buf: &mut [u8]) -> Result<()> {
        ensure!(buf.len() == PAGE_SIZE, "page buffer must be {} bytes", PAGE_SIZE);
        ensure!(
            page_no < self.page_count(),
            "page {} out of bounds (page_count={}) in '{}'",
            page_no,
            self.page_count(),
            self.path.display()
        );

        let offset = page_no as u64 * PAGE_SIZE as u64;
        self.file
            .read_exact_at(buf, offset)
            .wrap_err_with(|| format!("failed to read page {} of '{}'", page_no, self.path.display()))
    }

    pub fn write_page(&self, page_no: u32, buf: &[u8]) -> Result<()> {
        ensure!(buf.len() == PAGE_SIZE, "page buffer must be {} bytes", PAGE_SIZE);
        ensure!(
            page_no < self.page_count(),
            "page {} out of bounds (page_count={}) in '{}'",
            page_no,
            self.page_count(),
            self.path.display()
        );

        let offset = page_no as u64 * PAGE_SIZE as u64;
        self.file
            .write_all_at(buf, offset)
            .wrap_err_with(|| format!("failed to write page {} of '{}'", page_no, self.path.display()))
    }

    /// Extends the file by one zeroed page and returns its number.
    pub fn allocate_page(&self) -> Result<u32> {
        let page_no = self.page_count.load(Ordering::Acquire);
        let new_size = (page_no as u64 + 1) * PAGE_SIZE as u64;

        self.file
            .set_len(new_size)
            .wrap_err_with(|| format!("failed to extend '{}' to {} bytes", self.path.display(), new_size))?;

        self.page_count.store(page_no + 1, Ordering::Release);
        Ok(page_no)
    }

    pub fn sync(&self) -> Result<()> {
        self.file
            .sync_all()
            .wrap_err_with(|| format!("failed to sync '{}'", self.path.display()))
    }

    pub fn page_count(&self) -> u32 {
        self.page_count.load(Ordering::Acquire)
    }

    pub fn file_id(&self) -> u64 {
        self.file_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_starts_with_zero_pages() {
        let dir = tempdir().unwrap();
        let file = PagedFile::create(dir.path().join("a.idx")).unwrap();

        assert_eq!(file.page_count(), 0);
    }

    #[test]
    fn create_fails_if_file_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.idx");

        let _first = PagedFile::create(&path).unwrap();
        let second = PagedFile::create(&path);

        assert!(second.is_err());
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempdir().unwrap();
        let result = PagedFile::open(dir.path().join("missing.idx"));

        assert!(result.is_err());
    }

    #[test]
    fn open_rejects_partial_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torn.idx");
        std::fs::write(&path, vec![0u8; PAGE_SIZE + 100]).unwrap();

        let result = PagedFile::open(&path);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a multiple"));
    }

    #[test]
    fn allocate_extends_by_zeroed_pages() {
        let dir = tempdir().unwrap();
        let file = PagedFile::create(dir.path().join("a.idx")).unwrap();

        assert_eq!(file.allocate_page().unwrap(), 0);
        assert_eq!(file.allocate_page().unwrap(), 1);
        assert_eq!(file.page_count(), 2);

        let mut buf = vec![0xFFu8; PAGE_SIZE];
        file.read_page(1, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let file = PagedFile::create(dir.path().join("a.idx")).unwrap();
        file.allocate_page().unwrap();

        let mut page = vec![0u8; PAGE_SIZE];
        page[0] = 0xAB;
        page[PAGE_SIZE - 1] = 0xCD;
        file.write_page(0, &page).unwrap();

        let mut back = vec![0u8; PAGE_SIZE];
        file.read_page(0, &mut back).unwrap();
        assert_eq!(back, page);
    }

    #[test]
    fn read_out_of_bounds_fails() {
        let dir = tempdir().unwrap();
        let file = PagedFile::create(dir.path().join("a.idx")).unwrap();
        file.allocate_page().unwrap();

        let mut buf = vec![0u8; PAGE_SIZE];
        let result = file.read_page(5, &mut buf);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("out of bounds"));
    }

    #[test]
    fn reopen_sees_allocated_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.idx");

        {
            let file = PagedFile::create(&path).unwrap();
            file.allocate_page().unwrap();
            file.allocate_page().unwrap();
            file.sync().unwrap();
        }

        let reopened = PagedFile::open(&path).unwrap();
        assert_eq!(reopened.page_count(), 2);
    }

    #[test]
    fn file_ids_are_unique() {
        let dir = tempdir().unwrap();
        let a = PagedFile::create(dir.path().join("a.idx")).unwrap();
        let b = PagedFile::create(dir.path().join("b.idx")).unwrap();

        assert_ne!(a.file_id(), b.file_id());
    }
}
