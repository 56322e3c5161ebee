//! # File Header Definitions
//!
//! Each taproot file begins with a 128-byte header on page 0 holding magic
//! bytes, a format version, and type-specific metadata. The rest of page 0
//! is unused; data pages start at page 1, which lets page number 0 serve
//! as the null link throughout the tree.
//!
//! ## File Types
//!
//! 1. **Index files** (`<relation>.<offset>`): `IndexFileHeader` records
//!    which relation and attribute the index covers, the key datatype, and
//!    the current root page. The root moves when the tree grows a level,
//!    so the header is rewritten on every root split.
//!
//! 2. **Heap files** (`<relation>`): `HeapFileHeader` records the fixed
//!    record width and how many records have been appended.
//!
//! ## Zerocopy Safety
//!
//! Headers derive `FromBytes`/`IntoBytes`/`Unaligned`, so they are parsed
//! in place from page buffers without copying and without alignment
//! requirements. Multi-byte fields are little-endian.

use eyre::{ensure, Result};
use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{FILE_HEADER_SIZE, MAX_RELATION_NAME_LEN};
use crate::types::Datatype;

pub const INDEX_MAGIC: &[u8; 16] = b"Taproot Index\x00\x00\x00";
pub const HEAP_MAGIC: &[u8; 16] = b"Taproot Heap\x00\x00\x00\x00";

pub const CURRENT_VERSION: u32 = 1;

/// Header of an index file: identifies the indexed attribute and points at
/// the tree's current root.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct IndexFileHeader {
    magic: [u8; 16],
    version: U32,
    page_size: U32,
    relation_name: [u8; MAX_RELATION_NAME_LEN],
    attr_byte_offset: U32,
    attr_type: u8,
    root_is_leaf: u8,
    reserved0: [u8; 2],
    root_page: U32,
    reserved: [u8; 72],
}

const _: () = assert!(size_of::<IndexFileHeader>() == FILE_HEADER_SIZE);

impl IndexFileHeader {
    pub fn new(
        relation_name: &str,
        attr_byte_offset: u32,
        attr_type: Datatype,
        root_page: u32,
        root_is_leaf: bool,
    ) -> Result<Self> {
        ensure!(
            relation_name.len() <= MAX_RELATION_NAME_LEN,
            "relation name '{}' exceeds {} bytes",
            relation_name,
            MAX_RELATION_NAME_LEN
        );

        let mut name = [0u8; MAX_RELATION_NAME_LEN];
        name[..relation_name.len()].copy_from_slice(relation_name.as_bytes());

        Ok(Self {
            magic: *INDEX_MAGIC,
            version: U32::new(CURRENT_VERSION),
            page_size: U32::new(crate::config::PAGE_SIZE as u32),
            relation_name: name,
            attr_byte_offset: U32::new(attr_byte_offset),
            attr_type: attr_type as u8,
            root_is_leaf: if root_is_leaf { 1 } else { 0 },
            reserved0: [0; 2],
            root_page: U32::new(root_page),
            reserved: [0u8; 72],
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= FILE_HEADER_SIZE,
            "buffer too small for IndexFileHeader: {} < {}",
            bytes.len(),
            FILE_HEADER_SIZE
        );

        let header = Self::ref_from_bytes(&bytes[..FILE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse IndexFileHeader: {:?}", e))?;

        ensure!(
            &header.magic == INDEX_MAGIC,
            "invalid magic bytes in index file"
        );

        ensure!(
            header.version.get() == CURRENT_VERSION,
            "unsupported index file version: {} (expected {})",
            header.version.get(),
            CURRENT_VERSION
        );

        Ok(header)
    }

    pub fn from_bytes_mut(bytes: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            bytes.len() >= FILE_HEADER_SIZE,
            "buffer too small for IndexFileHeader: {} < {}",
            bytes.len(),
            FILE_HEADER_SIZE
        );

        let header = Self::mut_from_bytes(&mut bytes[..FILE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse IndexFileHeader: {:?}", e))?;

        ensure!(
            &header.magic == INDEX_MAGIC,
            "invalid magic bytes in index file"
        );

        Ok(header)
    }

    /// Relation name with the NUL padding stripped.
    pub fn relation_name(&self) -> Result<&str> {
        let end = self
            .relation_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_RELATION_NAME_LEN);
        std::str::from_utf8(&self.relation_name[..end])
            .map_err(|e| eyre::eyre!("relation name in index header is not UTF-8: {}", e))
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    pub fn attr_byte_offset(&self) -> u32 {
        self.attr_byte_offset.get()
    }

    pub fn attr_type(&self) -> Option<Datatype> {
        Datatype::from_byte(self.attr_type)
    }

    pub fn root_page(&self) -> u32 {
        self.root_page.get()
    }

    pub fn set_root_page(&mut self, page: u32) {
        self.root_page = U32::new(page);
    }

    pub fn root_is_leaf(&self) -> bool {
        self.root_is_leaf != 0
    }

    pub fn set_root_is_leaf(&mut self, is_leaf: bool) {
        self.root_is_leaf = if is_leaf { 1 } else { 0 };
    }
}

/// Header of a heap relation file: fixed record width plus a running count
/// of appended records.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct HeapFileHeader {
    magic: [u8; 16],
    version: U32,
    record_len: U32,
    record_count: U64,
    reserved: [u8; 96],
}

const _: () = assert!(size_of::<HeapFileHeader>() == FILE_HEADER_SIZE);

impl HeapFileHeader {
    pub fn new(record_len: u32) -> Self {
        Self {
            magic: *HEAP_MAGIC,
            version: U32::new(CURRENT_VERSION),
            record_len: U32::new(record_len),
            record_count: U64::new(0),
            reserved: [0u8; 96],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= FILE_HEADER_SIZE,
            "buffer too small for HeapFileHeader: {} < {}",
            bytes.len(),
            FILE_HEADER_SIZE
        );

        let header = Self::ref_from_bytes(&bytes[..FILE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse HeapFileHeader: {:?}", e))?;

        ensure!(
            &header.magic == HEAP_MAGIC,
            "invalid magic bytes in heap file"
        );

        ensure!(
            header.version.get() == CURRENT_VERSION,
            "unsupported heap file version: {} (expected {})",
            header.version.get(),
            CURRENT_VERSION
        );

        Ok(header)
    }

    pub fn from_bytes_mut(bytes: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            bytes.len() >= FILE_HEADER_SIZE,
            "buffer too small for HeapFileHeader: {} < {}",
            bytes.len(),
            FILE_HEADER_SIZE
        );

        let header = Self::mut_from_bytes(&mut bytes[..FILE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse HeapFileHeader: {:?}", e))?;

        ensure!(
            &header.magic == HEAP_MAGIC,
            "invalid magic bytes in heap file"
        );

        Ok(header)
    }

    pub fn record_len(&self) -> u32 {
        self.record_len.get()
    }

    pub fn record_count(&self) -> u64 {
        self.record_count.get()
    }

    pub fn set_record_count(&mut self, count: u64) {
        self.record_count = U64::new(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_header_size_is_128() {
        assert_eq!(size_of::<IndexFileHeader>(), 128);
    }

    #[test]
    fn heap_header_size_is_128() {
        assert_eq!(size_of::<HeapFileHeader>(), 128);
    }

    #[test]
    fn index_header_roundtrip() {
        let header = IndexFileHeader::new("orders", 4, Datatype::Integer, 1, true).unwrap();

        let bytes = header.as_bytes();
        let parsed = IndexFileHeader::from_bytes(bytes).unwrap();

        assert_eq!(parsed.relation_name().unwrap(), "orders");
        assert_eq!(parsed.attr_byte_offset(), 4);
        assert_eq!(parsed.attr_type(), Some(Datatype::Integer));
        assert_eq!(parsed.root_page(), 1);
        assert!(parsed.root_is_leaf());
    }

    #[test]
    fn index_header_rejects_long_relation_name() {
        let result = IndexFileHeader::new(
            "a_relation_name_well_past_the_limit",
            0,
            Datatype::Integer,
            1,
            true,
        );

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds"));
    }

    #[test]
    fn index_header_rejects_invalid_magic() {
        let mut bytes = [0u8; 128];
        bytes[..16].copy_from_slice(b"Invalid Magic!!!");

        let result = IndexFileHeader::from_bytes(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn index_header_root_updates_in_place() {
        let header = IndexFileHeader::new("orders", 4, Datatype::Integer, 1, true).unwrap();
        let mut bytes = [0u8; 128];
        bytes.copy_from_slice(header.as_bytes());

        {
            let header_mut = IndexFileHeader::from_bytes_mut(&mut bytes).unwrap();
            header_mut.set_root_page(9);
            header_mut.set_root_is_leaf(false);
        }

        let parsed = IndexFileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.root_page(), 9);
        assert!(!parsed.root_is_leaf());
    }

    #[test]
    fn heap_header_roundtrip() {
        let mut header = HeapFileHeader::new(32);
        header.set_record_count(100);

        let bytes = header.as_bytes();
        let parsed = HeapFileHeader::from_bytes(bytes).unwrap();

        assert_eq!(parsed.record_len(), 32);
        assert_eq!(parsed.record_count(), 100);
    }

    #[test]
    fn heap_header_rejects_invalid_magic() {
        let mut bytes = [0u8; 128];
        bytes[..16].copy_from_slice(b"Invalid Magic!!!");

        let result = HeapFileHeader::from_bytes(&bytes);
        assert!(result.is_err());
    }
}
