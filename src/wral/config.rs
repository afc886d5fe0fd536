//! Configuration for a segmented log writer/reader pair (§4.C, §4.H).

use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

use std::ffi;

/// Default record-count at which a segment rotates, chosen generously so
/// casual callers who don't tune it still see reasonably sized files.
pub const MAX_LOG_EVENTS: u64 = 1_000_000;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log name; also the segment file prefix.
    pub name: String,
    /// Directory holding this log's segment and logindex files.
    pub dir: ffi::OsString,
    /// Maximum number of records a segment may hold before rotation.
    #[serde(default = "Config::default_max_log_events")]
    pub max_log_events: u64,
    /// Fsync every append. Costs latency, buys durability across a crash.
    #[serde(default)]
    pub fsync: bool,
}

impl Config {
    fn default_max_log_events() -> u64 {
        MAX_LOG_EVENTS
    }

    pub fn new(name: &str, dir: &ffi::OsStr) -> Config {
        Config {
            name: name.to_string(),
            dir: dir.to_os_string(),
            max_log_events: MAX_LOG_EVENTS,
            fsync: false,
        }
    }

    pub fn set_max_log_events(mut self, max_log_events: u64) -> Config {
        self.max_log_events = max_log_events;
        self
    }

    pub fn set_fsync(mut self, fsync: bool) -> Config {
        self.fsync = fsync;
        self
    }
}

impl<'a> arbitrary::Arbitrary<'a> for Config {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Config> {
        let max_log_events = std::cmp::max(1, u64::arbitrary(u)? % 1000);
        Ok(Config {
            name: "arbitrary-wral".to_string(),
            dir: std::env::temp_dir().into_os_string(),
            max_log_events,
            fsync: bool::arbitrary(u)?,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
