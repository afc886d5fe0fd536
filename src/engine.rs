//! The embedded engine (§4.E, §4.F): primary-key allocation, append,
//! secondary-index maintenance, reader registration and ack persistence.
//! Reclamation (`remove`/`purge`, §4.G) lives in [crate::reclaim] as an
//! additional `impl Engine` block, since it cuts across both the entry
//! store and the readers store.

use lmdb::{Cursor, Transaction};

use std::{collections::BTreeMap, path::Path};

use crate::{
    err_at,
    model::{IndexDecl, ModelDescriptor},
    reader::Reader,
    registry::Registry,
    serializer::{NumericSerializer, Serializer},
    store::{get_u64, DataHandles, Store},
    EngineConfig, Entry, Result, Value,
};

const NEXT_EVENT_ID: &[u8] = b"next_event_id";

/// Translate a field's domain value into the order-preserving bytes an
/// index sub-database stores as its key, by routing it through that
/// index's *declared* serializer (§4.A, index variant) rather than
/// dispatching on the value's runtime shape.
pub(crate) fn encode_index_key(decl: &IndexDecl, value: &Value) -> Result<Vec<u8>> {
    decl.serializer.encode(value)
}

/// The embedded, append-only binary log (§1). Every public method opens
/// its own scoped environment/transaction (§4.D, §5) — there is no
/// persistent LMDB handle held between calls.
pub struct Engine {
    model: ModelDescriptor,
    store: Store,
}

impl Engine {
    /// Open (creating on first use) the data and readers environments
    /// under `base_path`, per the directories named in `model`.
    pub fn open<P: AsRef<Path>>(base_path: P, model: ModelDescriptor, config: EngineConfig) -> Result<Engine> {
        let store = Store::open(base_path.as_ref(), model.clone(), config)?;
        tracing::debug!(base_path = %base_path.as_ref().display(), model = %model.model_name, "engine opened");
        Ok(Engine { model, store })
    }

    /// No persistent handle is held between calls (§5), so closing is a
    /// no-op kept for symmetry with the source's explicit `close()`.
    pub fn close(self) -> Result<()> {
        tracing::debug!(model = %self.model.model_name, "engine closed");
        Ok(())
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    /// `create(**fields)` (§4.E). Allocates the next pk, appends the
    /// entry, and maintains every declared index, all in one transaction.
    ///
    /// `next_event_id` advances even when the entries append itself is
    /// refused: pk values are a reservation, never reused, by design
    /// (§9). That one case aside, any failure aborts the whole
    /// transaction.
    pub fn create(&self, fields: BTreeMap<String, Value>) -> Result<Entry> {
        let (env, handles) = self.store.data_env()?;
        let mut txn = err_at!(Lmdb, env.begin_rw_txn())?;

        let next_pk = get_u64(&txn, handles.config, NEXT_EVENT_ID, 0)?;
        let mut stored = Entry::new(fields);
        stored.mark_saved(next_pk);

        let key_bytes = NumericSerializer.encode(&next_pk)?;
        let val_bytes = stored.serialize()?;
        let append_outcome = txn.put(handles.entries, &key_bytes, &val_bytes, lmdb::WriteFlags::APPEND);

        let next_bytes = NumericSerializer.encode(&(next_pk + 1))?;
        if let Err(err) = txn.put(handles.config, &NEXT_EVENT_ID, &next_bytes, lmdb::WriteFlags::empty()) {
            txn.abort();
            return err_at!(Lmdb, Err(err));
        }

        if let Err(lmdb_err) = append_outcome {
            // the counter bump above still commits; see the function doc.
            err_at!(Lmdb, txn.commit())?;
            tracing::warn!(pk = next_pk, error = %lmdb_err, "append refused, next_event_id still advanced");
            return err_at!(Integrity, msg: "pk {} is not greater than the current maximum", next_pk);
        }

        if let Err(err) = self.index_one(&mut txn, &handles, &key_bytes, &stored) {
            txn.abort();
            return Err(err);
        }

        err_at!(Lmdb, txn.commit())?;
        tracing::debug!(pk = next_pk, "entry created");
        Ok(stored)
    }

    fn index_one(
        &self,
        txn: &mut lmdb::RwTransaction,
        handles: &DataHandles,
        pk_bytes: &[u8],
        entry: &Entry,
    ) -> Result<()> {
        for (index_name, decl) in self.model.indexes.iter() {
            match entry.get(&decl.field) {
                None if decl.mandatory => {
                    return err_at!(
                        InvalidValue,
                        msg: "index {:?} is mandatory but field {:?} is missing",
                        index_name,
                        decl.field
                    );
                }
                None => {}
                Some(value) => {
                    let ikey = encode_index_key(decl, value)?;
                    let db = handles.indexes[index_name];
                    match txn.put(db, &ikey, &pk_bytes, lmdb::WriteFlags::NO_DUP_DATA) {
                        Ok(()) | Err(lmdb::Error::KeyExist) => {}
                        Err(err) => return err_at!(Lmdb, Err(err)),
                    }
                }
            }
        }
        Ok(())
    }

    /// `bulk_create(entries)` (§4.E). Assigns consecutive pks starting at
    /// `next_event_id`, multi-puts them in append mode, and indexes them
    /// in the same transaction unless the model declares no indexes.
    pub fn bulk_create(&self, entries: Vec<BTreeMap<String, Value>>) -> Result<usize> {
        let (env, handles) = self.store.data_env()?;
        let mut txn = err_at!(Lmdb, env.begin_rw_txn())?;

        let next_pk = get_u64(&txn, handles.config, NEXT_EVENT_ID, 0)?;
        let consumed = entries.len() as u64;

        let mut stored_entries = Vec::with_capacity(entries.len());
        for (offset, fields) in entries.into_iter().enumerate() {
            let pk = next_pk + offset as u64;
            let mut stored = Entry::new(fields);
            stored.mark_saved(pk);

            let key_bytes = NumericSerializer.encode(&pk)?;
            let val_bytes = stored.serialize()?;
            match txn.put(handles.entries, &key_bytes, &val_bytes, lmdb::WriteFlags::APPEND) {
                Ok(()) => stored_entries.push((key_bytes, stored)),
                Err(_) => break,
            }
        }
        let added = stored_entries.len() as u64;

        let next_bytes = NumericSerializer.encode(&(next_pk + consumed))?;
        if let Err(err) = txn.put(handles.config, &NEXT_EVENT_ID, &next_bytes, lmdb::WriteFlags::empty()) {
            txn.abort();
            return err_at!(Lmdb, Err(err));
        }

        if !self.model.indexes.is_empty() {
            for (key_bytes, stored) in stored_entries.iter() {
                if let Err(err) = self.index_one(&mut txn, &handles, key_bytes, stored) {
                    txn.abort();
                    return Err(err);
                }
            }
        }

        err_at!(Lmdb, txn.commit())?;

        if consumed != added {
            tracing::warn!(consumed, added, "bulk_create consumed/added mismatch");
            return err_at!(Integrity, msg: "bulk_create consumed {} but added {}", consumed, added);
        }
        tracing::debug!(added, "bulk_create committed");
        Ok(added as usize)
    }

    pub(crate) fn get_entry(&self, pk: u64) -> Result<Entry> {
        self.store.data_read(|txn, handles| {
            let key_bytes = NumericSerializer.encode(&pk)?;
            match txn.get(handles.entries, &key_bytes) {
                Ok(bytes) => Entry::deserialize(bytes),
                Err(lmdb::Error::NotFound) => err_at!(NotFound, msg: "no entry with pk {}", pk),
                Err(err) => err_at!(Lmdb, Err(err)),
            }
        })
    }

    /// Point lookup over a declared index: every live pk whose field value
    /// encodes to `value` (§6: "query planning beyond single-index
    /// point/range lookups" is the only thing out of scope, not the
    /// lookups themselves).
    pub fn lookup(&self, index_name: &str, value: &Value) -> Result<Vec<u64>> {
        let decl = match self.model.indexes.get(index_name) {
            Some(decl) => decl,
            None => return err_at!(NotFound, msg: "no such index {:?}", index_name),
        };
        let ikey = encode_index_key(decl, value)?;
        self.store.data_read(|txn, handles| {
            let db = handles.indexes[index_name];
            let mut cursor = err_at!(Lmdb, txn.open_ro_cursor(db))?;
            let mut pks = vec![];
            for item in cursor.iter_dup_of(&ikey) {
                let (_, val) = err_at!(Lmdb, item)?;
                pks.push(NumericSerializer.decode(val)?);
            }
            Ok(pks)
        })
    }

    /// `register_reader(name)` (§4.F). Inserts an empty registry, never
    /// overwriting an already-registered reader.
    pub fn register_reader(&self, name: &str) -> Result<bool> {
        self.store.readers_write(|txn, handles| {
            match txn.get(handles.checkpoints, &name.as_bytes()) {
                Ok(_) => Ok(false),
                Err(lmdb::Error::NotFound) => {
                    let bytes = Registry::new().serialize()?;
                    err_at!(
                        Lmdb,
                        txn.put(handles.checkpoints, &name.as_bytes(), &bytes, lmdb::WriteFlags::empty())
                    )?;
                    Ok(true)
                }
                Err(err) => err_at!(Lmdb, Err(err)),
            }
        })
    }

    /// `unregister_reader(name)` (§4.F). Fails with *reader-not-found* if
    /// absent, or if attempted against a read-only store (§7).
    pub fn unregister_reader(&self, name: &str) -> Result<()> {
        if self.store.is_read_only() {
            return err_at!(ReaderNotFound, msg: "reader {:?} not registered (store is read-only)", name);
        }
        self.store.readers_write(|txn, handles| {
            match txn.del(handles.checkpoints, &name.as_bytes(), None) {
                Ok(()) => Ok(()),
                Err(lmdb::Error::NotFound) => {
                    err_at!(ReaderNotFound, msg: "reader {:?} not registered", name)
                }
                Err(err) => err_at!(Lmdb, Err(err)),
            }
        })
    }

    /// `list_readers()` (§4.F).
    pub fn list_readers(&self) -> Result<Vec<String>> {
        self.store.readers_read(|txn, handles| {
            let mut cursor = err_at!(Lmdb, txn.open_ro_cursor(handles.checkpoints))?;
            let mut names = vec![];
            for item in cursor.iter() {
                let (key, _) = err_at!(Lmdb, item)?;
                let name = err_at!(FailConvert, std::str::from_utf8(key))?;
                names.push(name.to_string());
            }
            Ok(names)
        })
    }

    /// `reader(name?)` (§4.F). With a name, loads its stored registry
    /// (failing with *reader-not-found* if it was never registered);
    /// without one, returns an anonymous reader bound to no stored state.
    pub fn reader(&self, name: Option<&str>) -> Result<Reader<'_>> {
        match name {
            Some(name) => {
                let registry = match self.load_registry(name)? {
                    Some(registry) => registry,
                    None => return err_at!(ReaderNotFound, msg: "reader {:?} not registered", name),
                };
                Ok(Reader::named(self, name.to_string(), registry))
            }
            None => Ok(Reader::anonymous(self)),
        }
    }

    fn load_registry(&self, name: &str) -> Result<Option<Registry>> {
        self.store.readers_read(|txn, handles| {
            match txn.get(handles.checkpoints, &name.as_bytes()) {
                Ok(bytes) => Ok(Some(Registry::deserialize(bytes)?)),
                Err(lmdb::Error::NotFound) => Ok(None),
                Err(err) => err_at!(Lmdb, Err(err)),
            }
        })
    }

    /// `save_registry(name, delta)` (§4.F). Atomically replaces the
    /// stored registry with `stored ∪ delta` — explicit overwrite, making
    /// repeated saves of the same delta idempotent (§8).
    pub fn save_registry(&self, name: &str, delta: &Registry) -> Result<()> {
        self.store.readers_write(|txn, handles| {
            let stored = match txn.get(handles.checkpoints, &name.as_bytes()) {
                Ok(bytes) => Registry::deserialize(bytes)?,
                Err(lmdb::Error::NotFound) => Registry::new(),
                Err(err) => return err_at!(Lmdb, Err(err)),
            };
            let merged = stored.union(delta);
            let bytes = merged.serialize()?;
            err_at!(
                Lmdb,
                txn.put(handles.checkpoints, &name.as_bytes(), &bytes, lmdb::WriteFlags::empty())
            )
        })
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
