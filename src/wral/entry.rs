//! On-disk record envelope for a segment (§4.C).

use cbordata::Cborize;

const ENTRY_VER: u32 = 0x00030001;

/// One record inside a segment file: a 1-based, within-segment record
/// number and the opaque payload bytes supplied by the caller.
#[derive(Clone, Debug, PartialEq, Cborize)]
pub struct Entry {
    pub recno: u64,
    pub data: Vec<u8>,
}

impl Entry {
    const ID: u32 = ENTRY_VER;

    pub fn new(recno: u64, data: Vec<u8>) -> Entry {
        Entry { recno, data }
    }
}
