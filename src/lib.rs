//! # taproot: Disk-Resident B+Tree Index
//!
//! taproot maintains a B+ tree index over one fixed-width 32-bit integer
//! attribute of records stored in a separate heap relation. For each
//! `(relation, attribute byte offset)` pair it persists an index file
//! mapping keys to record identifiers and answers range scans
//! `low <op> key <op> high` in key order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use taproot::{BTreeIndex, BufferPool, Datatype, Operator, DEFAULT_POOL_CAPACITY};
//!
//! # fn main() -> eyre::Result<()> {
//! let pool = Arc::new(BufferPool::new(DEFAULT_POOL_CAPACITY)?);
//! let (mut index, name) =
//!     BTreeIndex::open(Path::new("."), "orders", 4, Datatype::Integer, pool)?;
//!
//! index.start_scan(25, Operator::Gt, 40, Operator::Lt)?;
//! while let Ok(rid) = index.scan_next() {
//!     println!("match at page {} slot {}", rid.page_no(), rid.slot_no());
//! }
//! index.end_scan()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     Public API (BTreeIndex)         │   open / insert / scans
//! ├─────────────────────────────────────┤
//! │  B+Tree (btree/)  │  Heap (heap/)   │   node codecs, splits, scans
//! ├─────────────────────────────────────┤
//! │      Buffer Pool (buffer/)          │   pin/unpin, SIEVE eviction
//! ├─────────────────────────────────────┤
//! │      Storage Layer (storage/)       │   paged files, headers
//! └─────────────────────────────────────┘
//! ```
//!
//! The engine is single-threaded: one index instance, operations totally
//! ordered by the caller. Every page touch is a scoped pin on the buffer
//! pool, released before the public call returns.
//!
//! ## Module Overview
//!
//! - [`btree`]: the index itself, node layouts, insert with splits, scans
//! - [`buffer`]: fixed-capacity page cache with pin accounting
//! - [`storage`]: paged file I/O and on-disk headers
//! - [`heap`]: fixed-width-record relations that feed bulk loads
//! - [`config`]: page geometry and derived node capacities

pub mod btree;
pub mod buffer;
pub mod config;
pub mod error;
pub mod heap;
pub mod storage;
pub mod types;

pub use btree::BTreeIndex;
pub use buffer::{BufferPool, PageGuard};
pub use config::{
    DEFAULT_POOL_CAPACITY, INTERIOR_CAPACITY, INVALID_PAGE_NO, KEY_SIZE, LEAF_CAPACITY, PAGE_SIZE,
};
pub use error::IndexError;
pub use heap::HeapFile;
pub use types::{Datatype, Operator, RecordId};
