//! # Page Types and Header Layout
//!
//! Every 8KB page that holds node or heap data begins with a 16-byte
//! header describing its contents.
//!
//! ## Page Header Layout (16 bytes)
//!
//! ```text
//! Offset  Size  Field        Description
//! ------  ----  -----------  ----------------------------------------
//! 0       1     page_type    Type of page (BTreeLeaf, HeapData, ...)
//! 1       1     flags        Reserved flag bits
//! 2       2     entry_count  Number of occupied entries in this page
//! 4       2     level        Tree level: 0 = leaf, parents of leaves = 1
//! 6       6     reserved     Reserved for future use
//! 12      4     right_link   Right sibling (leaf) / rightmost child (interior)
//! ```
//!
//! Leaves chain left-to-right through `right_link`; an interior node keeps
//! its rightmost child there, so a node with N separators addresses N+1
//! children. A `right_link` of 0 means "none"; page 0 holds the file
//! header and never names a node.
//!
//! ## File Header vs Page Header
//!
//! Page 0 of each file carries a 128-byte file header (see
//! `storage::headers`) instead of this page header. Node and heap pages
//! start at page 1.
//!
//! All multi-byte fields are little-endian and the struct is unaligned, so
//! the header can be read in place from any page buffer.

use eyre::{ensure, Result};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{PAGE_HEADER_SIZE, PAGE_SIZE};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Unknown = 0x00,
    BTreeInterior = 0x01,
    BTreeLeaf = 0x02,
    HeapData = 0x03,
}

impl PageType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x01 => PageType::BTreeInterior,
            0x02 => PageType::BTreeLeaf,
            0x03 => PageType::HeapData,
            _ => PageType::Unknown,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct PageHeader {
    page_type: u8,
    flags: u8,
    entry_count: U16,
    level: U16,
    reserved: [u8; 6],
    right_link: U32,
}

const _: () = assert!(size_of::<PageHeader>() == PAGE_HEADER_SIZE);

impl PageHeader {
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type: page_type as u8,
            flags: 0,
            entry_count: U16::new(0),
            level: U16::new(0),
            reserved: [0; 6],
            right_link: U32::new(0),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read PageHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read PageHeader: {:?}", e))
    }

    pub fn write_to(&self, data: &mut [u8]) -> Result<()> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        data[..size_of::<Self>()].copy_from_slice(self.as_bytes());
        Ok(())
    }

    pub fn page_type(&self) -> PageType {
        PageType::from_byte(self.page_type)
    }

    pub fn set_page_type(&mut self, page_type: PageType) {
        self.page_type = page_type as u8;
    }

    pub fn entry_count(&self) -> u16 {
        self.entry_count.get()
    }

    pub fn set_entry_count(&mut self, count: u16) {
        self.entry_count = U16::new(count);
    }

    pub fn level(&self) -> u16 {
        self.level.get()
    }

    pub fn set_level(&mut self, level: u16) {
        self.level = U16::new(level);
    }

    pub fn right_link(&self) -> u32 {
        self.right_link.get()
    }

    pub fn set_right_link(&mut self, page_no: u32) {
        self.right_link = U32::new(page_no);
    }

    pub fn next_leaf(&self) -> u32 {
        self.right_link.get()
    }

    pub fn set_next_leaf(&mut self, page_no: u32) {
        self.right_link = U32::new(page_no);
    }
}

pub fn validate_page(data: &[u8]) -> Result<()> {
    ensure!(
        data.len() == PAGE_SIZE,
        "invalid page size: {} != {}",
        data.len(),
        PAGE_SIZE
    );

    let header = PageHeader::from_bytes(data)?;

    let is_zeroed = header.page_type == 0 && header.entry_count.get() == 0;
    if is_zeroed {
        return Ok(());
    }

    ensure!(
        header.page_type() != PageType::Unknown,
        "invalid page type: {:02x}",
        header.page_type
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_type_from_byte() {
        assert_eq!(PageType::from_byte(0x00), PageType::Unknown);
        assert_eq!(PageType::from_byte(0x01), PageType::BTreeInterior);
        assert_eq!(PageType::from_byte(0x02), PageType::BTreeLeaf);
        assert_eq!(PageType::from_byte(0x03), PageType::HeapData);
        assert_eq!(PageType::from_byte(0xFF), PageType::Unknown);
    }

    #[test]
    fn page_header_size_is_16_bytes() {
        assert_eq!(size_of::<PageHeader>(), 16);
    }

    #[test]
    fn page_header_new_initializes_correctly() {
        let header = PageHeader::new(PageType::BTreeLeaf);

        assert_eq!(header.page_type(), PageType::BTreeLeaf);
        assert_eq!(header.entry_count(), 0);
        assert_eq!(header.level(), 0);
        assert_eq!(header.right_link(), 0);
    }

    #[test]
    fn page_header_from_bytes_mut_modifies_in_place() {
        let mut data = [0u8; 16];

        {
            let header = PageHeader::from_bytes_mut(&mut data).unwrap();
            header.set_page_type(PageType::BTreeInterior);
            header.set_entry_count(42);
            header.set_level(3);
        }

        assert_eq!(data[0], 0x01);
        assert_eq!(data[2], 42);
        assert_eq!(data[4], 3);
    }

    #[test]
    fn page_header_from_bytes_too_small() {
        let data = [0u8; 8];
        let result = PageHeader::from_bytes(&data);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("buffer too small"));
    }

    #[test]
    fn page_header_right_link_and_next_leaf_alias() {
        let mut header = PageHeader::new(PageType::BTreeLeaf);

        header.set_right_link(12345);
        assert_eq!(header.next_leaf(), 12345);

        header.set_next_leaf(67890);
        assert_eq!(header.right_link(), 67890);
    }

    #[test]
    fn validate_page_rejects_wrong_size() {
        let data = [0u8; 100];
        let result = validate_page(&data);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid page size"));
    }

    #[test]
    fn validate_page_zeroed_is_valid() {
        let data = [0u8; PAGE_SIZE];
        assert!(validate_page(&data).is_ok());
    }

    #[test]
    fn validate_page_rejects_unknown_type_with_entries() {
        let mut data = [0u8; PAGE_SIZE];
        data[0] = 0xEE;
        data[2] = 1;

        let result = validate_page(&data);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid page type"));
    }
}
