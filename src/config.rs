//! Engine-level configuration (§4.H ambient stack).
//!
//! Mirrors the shape of [crate::wral::Config]: a plain struct with
//! builder-style setters plus a `from_toml` constructor, so a caller can
//! either assemble one programmatically or load it from an on-disk
//! profile the way the teacher's benchmark harnesses load theirs.

use serde::{Deserialize, Serialize};

use crate::{util, Result};

/// A generous default LMDB map size; large enough that casual callers
/// don't need to think about it, small enough not to surprise a laptop.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on the LMDB environments' memory-mapped size, shared by
    /// the data and readers environments.
    #[serde(default = "EngineConfig::default_map_size")]
    pub map_size: usize,
    /// Open both environments read-only. `register_reader`, `save_registry`
    /// and the entry/index manager's write paths are unavailable; attempts
    /// remap to *reader-not-found* on the reader-touching paths (§7).
    #[serde(default)]
    pub read_only: bool,
}

impl EngineConfig {
    fn default_map_size() -> usize {
        DEFAULT_MAP_SIZE
    }

    pub fn new() -> EngineConfig {
        EngineConfig {
            map_size: DEFAULT_MAP_SIZE,
            read_only: false,
        }
    }

    pub fn set_map_size(mut self, map_size: usize) -> EngineConfig {
        self.map_size = map_size;
        self
    }

    pub fn set_read_only(mut self, read_only: bool) -> EngineConfig {
        self.read_only = read_only;
        self
    }

    pub fn from_toml<P: AsRef<std::path::Path>>(loc: P) -> Result<EngineConfig> {
        util::load_toml(loc)
    }
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig::new()
    }
}
