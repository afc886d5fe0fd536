//! Storage engine contract: scoped acquisition of LMDB environments,
//! transactions and named sub-databases (§4.D).
//!
//! `Store` never keeps a live `Environment` around between calls — each
//! scoped method opens the environment, runs the caller's closure inside
//! one transaction, and closes everything on the way out. That is the
//! Rust rendering of the source's `contextmanager`-based scopes: the
//! closure plays the role of the `with` block's body, and the `Drop` glue
//! on `lmdb`'s own transaction types guarantees abort-on-panic even if the
//! closure never returns normally.

use lmdb::{self, Transaction};

use std::{collections::BTreeMap, fs, path::PathBuf};

use crate::{err_at, model::ModelDescriptor, util, EngineConfig, Result};

/// Sub-database handles opened for the data environment: `config`,
/// `entries`, and one per declared index.
pub struct DataHandles {
    pub config: lmdb::Database,
    pub entries: lmdb::Database,
    pub indexes: BTreeMap<String, lmdb::Database>,
}

/// Sub-database handle opened for the readers environment.
pub struct ReadersHandles {
    pub checkpoints: lmdb::Database,
}

pub struct Store {
    model: ModelDescriptor,
    config: EngineConfig,
    data_dir: PathBuf,
    readers_dir: PathBuf,
}

impl Store {
    pub fn open(base_path: &std::path::Path, model: ModelDescriptor, config: EngineConfig) -> Result<Store> {
        let data_dir = util::join_dir(base_path, &model.data_env_directory);
        let readers_dir = util::join_dir(base_path, &model.readers_env_directory);
        err_at!(IOError, fs::create_dir_all(&data_dir))?;
        err_at!(IOError, fs::create_dir_all(&readers_dir))?;
        Ok(Store {
            model,
            config,
            data_dir,
            readers_dir,
        })
    }

    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    fn open_env(&self, dir: &std::path::Path, max_dbs: u32) -> Result<lmdb::Environment> {
        let mut builder = lmdb::Environment::new();
        builder.set_max_dbs(max_dbs);
        builder.set_map_size(self.config.map_size);
        if self.config.read_only {
            builder.set_flags(lmdb::EnvironmentFlags::READ_ONLY);
        }
        err_at!(Lmdb, builder.open(dir))
    }

    fn open_data_handles(&self, env: &lmdb::Environment) -> Result<DataHandles> {
        let config = err_at!(
            Lmdb,
            env.create_db(Some(&self.model.config_db_name), lmdb::DatabaseFlags::empty())
        )?;
        let entries = err_at!(
            Lmdb,
            env.create_db(Some(&self.model.entries_db_name), lmdb::DatabaseFlags::empty())
        )?;
        let mut indexes = BTreeMap::new();
        for index_name in self.model.indexes.keys() {
            let db_name = self.model.index_db_name(index_name);
            let db = err_at!(
                Lmdb,
                env.create_db(Some(&db_name), lmdb::DatabaseFlags::DUP_SORT)
            )?;
            indexes.insert(index_name.clone(), db);
        }
        Ok(DataHandles {
            config,
            entries,
            indexes,
        })
    }

    fn open_readers_handles(&self, env: &lmdb::Environment) -> Result<ReadersHandles> {
        let checkpoints = err_at!(
            Lmdb,
            env.create_db(Some(&self.model.checkpoints_db_name), lmdb::DatabaseFlags::empty())
        )?;
        Ok(ReadersHandles { checkpoints })
    }

    /// Open the data environment and its handles without beginning a
    /// transaction. Used by `create`/`bulk_create`, which manage the
    /// transaction themselves to implement the pk-reservation-on-failure
    /// behavior (§4.E, §9).
    pub fn data_env(&self) -> Result<(lmdb::Environment, DataHandles)> {
        tracing::debug!(dir = ?self.data_dir, "acquiring data environment");
        let env = self.open_env(&self.data_dir, 2 + self.model.indexes.len() as u32)?;
        let handles = self.open_data_handles(&env)?;
        Ok((env, handles))
    }

    /// Run `f` inside a write transaction over the data environment,
    /// committing on success and aborting on error.
    pub fn data_write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut lmdb::RwTransaction, &DataHandles) -> Result<T>,
    {
        let (env, handles) = self.data_env()?;
        let mut txn = err_at!(Lmdb, env.begin_rw_txn())?;
        match f(&mut txn, &handles) {
            Ok(val) => {
                err_at!(Lmdb, txn.commit())?;
                Ok(val)
            }
            Err(err) => {
                txn.abort();
                Err(err)
            }
        }
    }

    /// Run `f` inside a read-only transaction over the data environment.
    pub fn data_read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&lmdb::RoTransaction, &DataHandles) -> Result<T>,
    {
        let (env, handles) = self.data_env()?;
        let txn = err_at!(Lmdb, env.begin_ro_txn())?;
        f(&txn, &handles)
    }

    fn readers_env(&self) -> Result<(lmdb::Environment, ReadersHandles)> {
        tracing::debug!(dir = ?self.readers_dir, "acquiring readers environment");
        let env = self.open_env(&self.readers_dir, 1)?;
        let handles = self.open_readers_handles(&env)?;
        Ok((env, handles))
    }

    /// Run `f` inside a write transaction over the readers environment,
    /// committing on success and aborting on error.
    pub fn readers_write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut lmdb::RwTransaction, &ReadersHandles) -> Result<T>,
    {
        let (env, handles) = self.readers_env()?;
        let mut txn = err_at!(Lmdb, env.begin_rw_txn())?;
        match f(&mut txn, &handles) {
            Ok(val) => {
                err_at!(Lmdb, txn.commit())?;
                Ok(val)
            }
            Err(err) => {
                txn.abort();
                Err(err)
            }
        }
    }

    /// Run `f` inside a read-only transaction over the readers environment.
    pub fn readers_read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&lmdb::RoTransaction, &ReadersHandles) -> Result<T>,
    {
        let (env, handles) = self.readers_env()?;
        let txn = err_at!(Lmdb, env.begin_ro_txn())?;
        f(&txn, &handles)
    }
}

/// Read a big-endian `u64` key out of any LMDB transaction kind, treating
/// a missing key as `default`.
pub(crate) fn get_u64<T: Transaction>(
    txn: &T,
    db: lmdb::Database,
    key: &[u8],
    default: u64,
) -> Result<u64> {
    use crate::serializer::{NumericSerializer, Serializer};

    match txn.get(db, &key) {
        Ok(bytes) => NumericSerializer.decode(bytes),
        Err(lmdb::Error::NotFound) => Ok(default),
        Err(err) => err_at!(Lmdb, Err(err)),
    }
}
