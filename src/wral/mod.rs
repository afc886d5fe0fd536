//! Segmented, append-only log writer and reader (§4.C).
//!
//! A log is a sequence of segment files, each holding up to
//! `max_log_events` records. [Writer] appends synchronously, in the calling
//! thread, rotating to a new segment only once the current one is full —
//! and even then the rotation is deferred to the *next* append, so a full
//! segment is never closed ahead of the record that fills it.
//!
//! [Reader] is an independent, checkpointed cursor over the same segment
//! files, useful when the full transactional entry/index layer is more
//! than the caller needs.

mod config;
mod entry;
mod files;
mod logindex;
mod reader;
mod segment;
mod writer;

pub use config::{Config, MAX_LOG_EVENTS};
pub use entry::Entry;
pub use reader::Reader;
pub use writer::Writer;
