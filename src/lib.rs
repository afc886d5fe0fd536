//! `binlog`: an embedded, single-process, append-only binary log with
//! durable per-reader acknowledgement.
//!
//! Producers append structured [Entry] records through [Engine::create]
//! and [Engine::bulk_create]. Independent named [Reader]s traverse the
//! log at their own pace and persistently record which primary keys
//! they've acknowledged in a compact [Registry]. Once every registered
//! reader has acked a record, [Engine::remove] or [Engine::purge] can
//! reclaim it, along with any secondary-index edges pointing at it.
//!
//! The transactional storage substrate is LMDB, via the `lmdb` crate
//! ([Store], [Engine]). A lower-level, non-transactional layering — a
//! segmented, rotating append-only log — is exposed separately as
//! [wral] for callers who don't need the entry/index machinery.
//!
//! Record fields and secondary-index declarations are supplied by the
//! caller as a [model::ModelDescriptor]; this crate core never defines a
//! schema language of its own.

mod config;
mod engine;
mod entry;
mod error;
mod model;
mod reader;
mod reclaim;
mod registry;
mod serializer;
mod store;
mod util;

pub mod wral;

pub use config::EngineConfig;
pub use engine::Engine;
pub use entry::Entry;
pub use error::{Error, Result};
pub use model::{IndexDecl, ModelDescriptor};
pub use reader::{Ack, Reader};
pub use registry::Registry;
pub use serializer::{
    DatetimeSerializer, IndexSerializer, NullListSerializer, NumericSerializer, ObjectSerializer,
    Serializer, TextSerializer, Value,
};
