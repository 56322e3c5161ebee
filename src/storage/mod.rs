//! # Storage Module
//!
//! The disk-facing layer: paged files, the 16-byte node page header, and
//! the 128-byte file headers that occupy page 0 of each file.
//!
//! Everything above this layer goes through the buffer pool (`crate::buffer`)
//! for caching and pin accounting; `PagedFile` itself is a stateless page
//! conduit with positional reads and writes.
//!
//! ## Module Organization
//!
//! - `file`: `PagedFile`, whole-page positional I/O with size validation
//! - `page`: node page header and page-type tags
//! - `headers`: index and heap file headers (magic, version, metadata)

mod file;
mod headers;
mod page;

pub use file::PagedFile;
pub use headers::{HeapFileHeader, IndexFileHeader, CURRENT_VERSION, HEAP_MAGIC, INDEX_MAGIC};
pub use page::{validate_page, PageHeader, PageType};

pub use crate::config::{FILE_HEADER_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE, PAGE_USABLE_SIZE};
