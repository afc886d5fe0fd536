//! Module implement common utility functions shared across the storage,
//! wral and engine layers.

use cbordata::{Cbor, FromCbor, IntoCbor};

use std::{ffi, fs, path};

use crate::{err_at, Result};

mod files;

pub use files::{create_file_a, open_file_a, open_file_r, sync_write};

/// Helper function to serialize value `T` implementing IntoCbor, into byte-string.
pub fn into_cbor_bytes<T>(val: T) -> Result<Vec<u8>>
where
    T: IntoCbor,
{
    let mut data: Vec<u8> = vec![];
    let n = err_at!(
        FailCbor,
        err_at!(FailCbor, val.into_cbor())?.encode(&mut data)
    )?;
    if n != data.len() {
        err_at!(Fatal, msg: "cbor encoding len mismatch {} {}", n, data.len())
    } else {
        Ok(data)
    }
}

/// Helper function to deserialize value `T` implementing FromCbor, from byte-string.
/// Return (value, bytes-consumed)
pub fn from_cbor_bytes<T>(mut data: &[u8]) -> Result<(T, usize)>
where
    T: FromCbor,
{
    let (val, n) = err_at!(FailCbor, Cbor::decode(&mut data))?;
    Ok((err_at!(FailCbor, T::from_cbor(val))?, n))
}

/// Load a toml file and parse it into type `T`.
pub fn load_toml<P, T>(loc: P) -> Result<T>
where
    P: AsRef<path::Path>,
    T: serde::de::DeserializeOwned,
{
    use std::str::from_utf8;

    let ploc: &path::Path = loc.as_ref();
    let data = err_at!(IOError, fs::read(ploc))?;
    let s = err_at!(FailConfig, from_utf8(&data), "not utf8 for {:?}", ploc)?;
    err_at!(FailConfig, toml::from_str(s), "file:{:?}", ploc)
}

/// Join a relative directory onto a base path, the way environment
/// directories are resolved from a model descriptor.
pub fn join_dir(base: &path::Path, rel: &ffi::OsStr) -> path::PathBuf {
    let mut full = base.to_path_buf();
    full.push(rel);
    full
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
