//! Reclamation (§4.G): `remove` and `purge`, the two operations that
//! physically delete entries once every registered reader has acked them.

use lmdb::Transaction;

use crate::{engine::encode_index_key, err_at, registry::Registry, serializer::{NumericSerializer, Serializer}, Engine, Entry, Result};

impl Engine {
    /// `remove(entry)` (§4.G). `false` (no mutation) if any reader has not
    /// yet acked `entry`; otherwise deletes the entry and every index edge
    /// pointing at it, atomically.
    pub fn remove(&self, entry: &Entry) -> Result<bool> {
        let pk = match entry.pk() {
            Some(pk) => pk,
            None => return err_at!(InvalidValue, msg: "cannot remove an unsaved entry"),
        };

        let names = self.list_readers()?;
        if names.is_empty() {
            return err_at!(ReaderNotFound, msg: "no registered readers");
        }

        let all_acked = self.store().readers_read(|txn, handles| {
            for name in names.iter() {
                let registry = match txn.get(handles.checkpoints, &name.as_bytes()) {
                    Ok(bytes) => Registry::deserialize(bytes)?,
                    Err(lmdb::Error::NotFound) => Registry::new(),
                    Err(err) => return err_at!(Lmdb, Err(err)),
                };
                if !registry.contains(pk) {
                    return Ok(false);
                }
            }
            Ok(true)
        })?;
        if !all_acked {
            return Ok(false);
        }

        self.store().data_write(|txn, handles| {
            let key_bytes = NumericSerializer.encode(&pk)?;
            err_at!(Lmdb, txn.del(handles.entries, &key_bytes, None))?;
            for (index_name, decl) in self.model().indexes.iter() {
                if let Some(value) = entry.get(&decl.field) {
                    let ikey = encode_index_key(decl, value)?;
                    let db = handles.indexes[index_name];
                    match txn.del(db, &ikey, Some(key_bytes.as_slice())) {
                        Ok(()) | Err(lmdb::Error::NotFound) => {}
                        Err(err) => return err_at!(Lmdb, Err(err)),
                    }
                }
            }
            Ok(())
        })?;

        tracing::debug!(pk, "entry removed (all readers acked)");
        Ok(true)
    }

    /// `purge()` (§4.G). Intersects every registered reader's registry and
    /// deletes every entry (plus index edges) acknowledged by all of them.
    ///
    /// The second element of the returned tuple is always `0`: the source
    /// resets, rather than increments, its `errors` counter inside the
    /// deletion loop, so it can never observe a non-zero value. Preserved
    /// as-is rather than silently "fixed" (§9).
    pub fn purge(&self) -> Result<(usize, usize)> {
        let names = self.list_readers()?;
        if names.is_empty() {
            return Ok((0, 0));
        }

        let common = self.store().readers_read(|txn, handles| {
            let mut common: Option<Registry> = None;
            for name in names.iter() {
                let registry = match txn.get(handles.checkpoints, &name.as_bytes()) {
                    Ok(bytes) => Registry::deserialize(bytes)?,
                    Err(lmdb::Error::NotFound) => Registry::new(),
                    Err(err) => return err_at!(Lmdb, Err(err)),
                };
                common = Some(match common {
                    Some(acc) => acc.intersection(&registry),
                    None => registry,
                });
            }
            Ok(common.unwrap_or_default())
        })?;

        let removed: usize = self.store().data_write(|txn, handles| {
            let mut removed = 0usize;
            for pk in common.iter() {
                let key_bytes = NumericSerializer.encode(&pk)?;
                let entry = match txn.get(handles.entries, &key_bytes) {
                    Ok(bytes) => Entry::deserialize(bytes)?,
                    Err(lmdb::Error::NotFound) => continue,
                    Err(err) => return err_at!(Lmdb, Err(err)),
                };
                err_at!(Lmdb, txn.del(handles.entries, &key_bytes, None))?;
                for (index_name, decl) in self.model().indexes.iter() {
                    if let Some(value) = entry.get(&decl.field) {
                        let ikey = encode_index_key(decl, value)?;
                        let db = handles.indexes[index_name];
                        match txn.del(db, &ikey, Some(key_bytes.as_slice())) {
                            Ok(()) | Err(lmdb::Error::NotFound) => {}
                            Err(err) => return err_at!(Lmdb, Err(err)),
                        }
                    }
                }
                removed += 1;
            }
            Ok(removed)
        })?;

        tracing::debug!(removed, "purge complete");
        Ok((removed, 0))
    }
}

#[cfg(test)]
#[path = "reclaim_test.rs"]
mod reclaim_test;
