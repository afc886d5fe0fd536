//! A single record in the log (§3).
//!
//! An [Entry] is an ordered mapping from field name to [crate::Value],
//! carrying the two pieces of metadata the engine owns: `pk` and `saved`.
//! Once `saved` is true the `pk` is immutable — the entry has been
//! appended and assigned its place in the log.

use cbordata::Cborize;

use std::collections::BTreeMap;

use crate::{util, Result, Value};

const ENTRY_VER: u32 = 0x00040001;

/// A record's fields plus engine-owned identity metadata.
#[derive(Clone, Debug, PartialEq, Cborize)]
pub struct Entry {
    pk: Option<u64>,
    saved: bool,
    fields: BTreeMap<String, Value>,
}

impl Entry {
    const ID: u32 = ENTRY_VER;

    /// A fresh, unsaved entry. `pk` is assigned only on a successful
    /// `create`/`bulk_create`.
    pub fn new(fields: BTreeMap<String, Value>) -> Entry {
        Entry {
            pk: None,
            saved: false,
            fields,
        }
    }

    pub fn pk(&self) -> Option<u64> {
        self.pk
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Transition to saved, fixing `pk`. Only the entry/index manager
    /// calls this, immediately before (and, for the reservation-on-failure
    /// path described in §9, sometimes regardless of) persisting it.
    pub(crate) fn mark_saved(&mut self, pk: u64) {
        self.pk = Some(pk);
        self.saved = true;
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        util::into_cbor_bytes(self.clone())
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Entry> {
        let (entry, _) = util::from_cbor_bytes(bytes)?;
        Ok(entry)
    }
}
