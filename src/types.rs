//! Shared value types: record identifiers, scan operators, key datatypes.

use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::RECORD_ID_SIZE;

/// Identifies a record in the heap relation by page number and slot.
///
/// Stored verbatim in leaf entries, so the layout is fixed at 8 bytes with
/// little-endian fields.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct RecordId {
    page_no: U32,
    slot_no: U16,
    reserved: U16,
}

const _: () = assert!(size_of::<RecordId>() == RECORD_ID_SIZE);

impl RecordId {
    pub fn new(page_no: u32, slot_no: u16) -> Self {
        Self {
            page_no: U32::new(page_no),
            slot_no: U16::new(slot_no),
            reserved: U16::new(0),
        }
    }

    pub fn page_no(&self) -> u32 {
        self.page_no.get()
    }

    pub fn slot_no(&self) -> u16 {
        self.slot_no.get()
    }
}

/// Comparison operators accepted by `start_scan`.
///
/// Only `Gt`/`Ge` are valid for the low bound and `Lt`/`Le` for the high
/// bound; the full set exists for callers that build predicates generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

/// Datatype of the indexed attribute. Persisted in the index file header;
/// only `Integer` is accepted when opening an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Datatype {
    Integer = 0,
    Double = 1,
    Text = 2,
}

impl Datatype {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Datatype::Integer),
            1 => Some(Datatype::Double),
            2 => Some(Datatype::Text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_8_bytes() {
        assert_eq!(size_of::<RecordId>(), 8);
    }

    #[test]
    fn record_id_round_trips_through_bytes() {
        let rid = RecordId::new(42, 7);
        let bytes = rid.as_bytes();

        let parsed = RecordId::read_from_bytes(bytes).unwrap();
        assert_eq!(parsed.page_no(), 42);
        assert_eq!(parsed.slot_no(), 7);
        assert_eq!(parsed, rid);
    }

    #[test]
    fn datatype_from_byte_rejects_unknown_tags() {
        assert_eq!(Datatype::from_byte(0), Some(Datatype::Integer));
        assert_eq!(Datatype::from_byte(1), Some(Datatype::Double));
        assert_eq!(Datatype::from_byte(2), Some(Datatype::Text));
        assert_eq!(Datatype::from_byte(9), None);
    }
}
