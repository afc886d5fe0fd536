//! The registry mapping segment number to segment file name (§4.C).
//!
//! Persisted as its own small file, `<name>.logindex`, next to the segments
//! it tracks, so a fresh process can rebuild `Writer`/`Reader` state without
//! re-listing the directory.

use cbordata::Cborize;

use std::{ffi, path};

use crate::{err_at, util, Result};

const LOGINDEX_VER: u32 = 0x00030002;

#[derive(Clone, Debug, PartialEq, Cborize)]
struct Slot {
    number: u32,
    filename: String,
}

impl Slot {
    const ID: u32 = LOGINDEX_VER;
}

/// Ordered, by-construction, map from segment number to segment file name.
#[derive(Clone, Debug, Default)]
pub struct LogIndex {
    slots: Vec<Slot>,
}

impl LogIndex {
    fn index_path(dir: &ffi::OsStr, name: &str) -> path::PathBuf {
        util::join_dir(path::Path::new(dir), ffi::OsStr::new(&format!("{}.logindex", name)))
    }

    /// Load the logindex for `name` under `dir`, or an empty one if it has
    /// never been written.
    pub fn load(dir: &ffi::OsStr, name: &str) -> Result<LogIndex> {
        let path = LogIndex::index_path(dir, name);
        if !path.exists() {
            return Ok(LogIndex { slots: vec![] });
        }
        let data = err_at!(IOError, std::fs::read(&path))?;
        let (slots, _): (Vec<Slot>, usize) = util::from_cbor_bytes(&data)?;
        Ok(LogIndex { slots })
    }

    fn save(&self, dir: &ffi::OsStr, name: &str) -> Result<()> {
        let path = LogIndex::index_path(dir, name);
        let bytes = util::into_cbor_bytes(self.slots.clone())?;
        err_at!(IOError, std::fs::write(&path, &bytes))?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The greatest segment number registered, if any.
    pub fn last(&self) -> Option<u32> {
        self.slots.last().map(|s| s.number)
    }

    pub fn numbers(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.number).collect()
    }

    pub fn contains(&self, number: u32) -> bool {
        self.slots.iter().any(|s| s.number == number)
    }

    /// Register a newly created segment and persist the index.
    pub fn push(&mut self, dir: &ffi::OsStr, name: &str, number: u32, filename: String) -> Result<()> {
        self.slots.push(Slot { number, filename });
        self.save(dir, name)
    }

    /// Remove a segment's entry and persist the index.
    pub fn remove(&mut self, dir: &ffi::OsStr, name: &str, number: u32) -> Result<()> {
        self.slots.retain(|s| s.number != number);
        self.save(dir, name)
    }
}

#[cfg(test)]
#[path = "logindex_test.rs"]
mod logindex_test;
