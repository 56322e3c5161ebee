//! # taproot Configuration Constants
//!
//! All page-geometry and sizing constants, grouped by functional area.
//! Node capacities are derived from the page size; the derivations are
//! enforced below with compile-time assertions.
//!
//! ```text
//! PAGE_SIZE (8192 bytes)
//!       │
//!       ├─> PAGE_HEADER_SIZE (16 bytes, every node page)
//!       │
//!       ├─> PAGE_USABLE_SIZE (derived: PAGE_SIZE - PAGE_HEADER_SIZE)
//!       │
//!       ├─> FILE_HEADER_SIZE (128 bytes, page 0 only)
//!       │
//!       ├─> LEAF_CAPACITY      (derived: usable / 12, rounded down to even)
//!       │
//!       └─> INTERIOR_CAPACITY  (derived: usable / 8, rounded down to even)
//! ```
//!
//! Capacities are kept even so a node split divides cleanly into two
//! halves. An interior node with `INTERIOR_CAPACITY` separators addresses
//! `INTERIOR_CAPACITY + 1` children (the rightmost child pointer lives in
//! the page header).

// ============================================================================
// PAGE LAYOUT
// ============================================================================

/// Size of each page in bytes. The fundamental unit of I/O and caching.
pub const PAGE_SIZE: usize = 8192;

/// Size of the header that begins every node page.
pub const PAGE_HEADER_SIZE: usize = 16;

/// Size of the file header occupying the start of page 0.
pub const FILE_HEADER_SIZE: usize = 128;

/// Usable space in a node page after the header.
pub const PAGE_USABLE_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE;

/// Usable space in page 0 after the file header.
pub const PAGE0_USABLE_SIZE: usize = PAGE_SIZE - FILE_HEADER_SIZE;

/// Page number 0 never names a node page (page 0 holds the file header),
/// so it doubles as the null link: no right sibling, no child, no root.
pub const INVALID_PAGE_NO: u32 = 0;

// ============================================================================
// NODE GEOMETRY
// These derive from PAGE_SIZE; the assertions below keep them honest.
// ============================================================================

/// Size of an index key in bytes (32-bit signed integer).
pub const KEY_SIZE: usize = 4;

/// Size of a record identifier in bytes (heap page number + slot + pad).
pub const RECORD_ID_SIZE: usize = 8;

/// Size of one leaf entry: key plus record id.
pub const LEAF_ENTRY_SIZE: usize = KEY_SIZE + RECORD_ID_SIZE;

/// Size of one interior entry: separator key plus left child page number.
pub const INTERIOR_ENTRY_SIZE: usize = KEY_SIZE + 4;

/// Maximum entries in a leaf node, rounded down to an even count.
pub const LEAF_CAPACITY: usize = (PAGE_USABLE_SIZE / LEAF_ENTRY_SIZE) / 2 * 2;

/// Maximum separators in an interior node, rounded down to an even count.
pub const INTERIOR_CAPACITY: usize = (PAGE_USABLE_SIZE / INTERIOR_ENTRY_SIZE) / 2 * 2;

const _: () = assert!(LEAF_CAPACITY % 2 == 0, "leaf capacity must split evenly");
const _: () = assert!(
    INTERIOR_CAPACITY % 2 == 0,
    "interior capacity must split evenly"
);
const _: () = assert!(
    PAGE_HEADER_SIZE + LEAF_CAPACITY * LEAF_ENTRY_SIZE <= PAGE_SIZE,
    "leaf entries must fit in a page"
);
const _: () = assert!(
    PAGE_HEADER_SIZE + INTERIOR_CAPACITY * INTERIOR_ENTRY_SIZE <= PAGE_SIZE,
    "interior entries must fit in a page"
);

// ============================================================================
// INDEX METADATA
// ============================================================================

/// Longest relation name the index file header can record.
pub const MAX_RELATION_NAME_LEN: usize = 20;

// ============================================================================
// BUFFER POOL SIZING
// ============================================================================

/// Default number of page frames in the buffer pool.
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Smallest pool that still leaves headroom for the pages a single insert
/// pins at once (meta page, two leaves, two interiors during a cascade).
pub const MIN_POOL_CAPACITY: usize = 8;

const _: () = assert!(
    MIN_POOL_CAPACITY <= DEFAULT_POOL_CAPACITY,
    "default pool must satisfy the minimum"
);
