//! Pluggable, order-preserving codecs between domain values and sortable
//! byte strings (§4.A), plus the tagged domain-value type entries carry.

use cbordata::Cborize;
use chrono::{DateTime, TimeZone, Utc};

use std::{collections::BTreeMap, convert::TryFrom};

use crate::{err_at, util, Error, Result};

const VALUE_VER: u32 = 0x00010001;

/// Tagged, nested domain value. Stands in for the source's free-form field
/// dictionary (§9): any entry field, and any nested `Object` member, is one
/// of these four shapes.
#[derive(Clone, Debug, PartialEq, Cborize)]
pub enum Value {
    Uint(u64),
    Text(String),
    /// Seconds since the Unix epoch. `Value` itself stays cbordata-native;
    /// conversion to/from `chrono::DateTime<Utc>` happens at the
    /// `DatetimeSerializer` boundary.
    Seconds(i64),
    Object(BTreeMap<String, Value>),
}

impl Value {
    const ID: u32 = VALUE_VER;
}

/// A pure, total codec between a domain value and its byte-string form.
/// Implementations MUST satisfy `decode(encode(v)) == v` for every `v` in
/// their domain (§8, serializer round-trip law).
pub trait Serializer {
    type Value;

    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<Self::Value>;
}

/// 8-byte big-endian encoding of `u64`. Byte-lex order equals numeric order,
/// which is what makes fixed-width keys in the entries sub-database
/// (§3) usable as an LMDB key directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumericSerializer;

impl Serializer for NumericSerializer {
    type Value = u64;

    fn encode(&self, value: &u64) -> Result<Vec<u8>> {
        Ok(value.to_be_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<u64> {
        let arr: [u8; 8] = err_at!(
            FailConvert,
            <[u8; 8]>::try_from(bytes),
            "numeric serializer wants 8 bytes, got {}",
            bytes.len()
        )?;
        Ok(u64::from_be_bytes(arr))
    }
}

/// UTF-8 encoding of text. Byte-lex order equals codepoint order.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextSerializer;

impl Serializer for TextSerializer {
    type Value = String;

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let s = err_at!(FailConvert, std::str::from_utf8(bytes), "text serializer")?;
        Ok(s.to_string())
    }
}

/// Deterministic, self-describing encoding for an arbitrary nested [Value].
/// Order is not meaningful; this serializer is used for values, never keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectSerializer;

impl Serializer for ObjectSerializer {
    type Value = Value;

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        util::into_cbor_bytes(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        let (value, _) = util::from_cbor_bytes(bytes)?;
        Ok(value)
    }
}

/// Fixed-width encoding of a UTC timestamp, monotone in time. Rejects years
/// before 1970, since the encoding stores non-negative seconds as an 8-byte
/// big-endian integer, reusing [NumericSerializer]'s ordering guarantee.
#[derive(Clone, Copy, Debug, Default)]
pub struct DatetimeSerializer;

impl Serializer for DatetimeSerializer {
    type Value = DateTime<Utc>;

    fn encode(&self, value: &DateTime<Utc>) -> Result<Vec<u8>> {
        let secs = value.timestamp();
        if secs < 0 {
            return err_at!(InvalidValue, msg: "datetime before 1970: {}", value);
        }
        NumericSerializer.encode(&(secs as u64))
    }

    fn decode(&self, bytes: &[u8]) -> Result<DateTime<Utc>> {
        let secs = NumericSerializer.decode(bytes)?;
        match Utc.timestamp_opt(secs as i64, 0).single() {
            Some(dt) => Ok(dt),
            None => err_at!(InvalidValue, msg: "out of range timestamp {}", secs),
        }
    }
}

/// Encodes a dotted name — a single string drawn from the ASCII-letter/dot
/// alphabet, non-empty, never containing a raw NUL byte — by mapping each
/// `.` separator to `\0`, so byte-lex order groups names by their leading
/// components the way a joined multi-part key would.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullListSerializer;

impl NullListSerializer {
    fn validate(value: &str) -> Result<()> {
        if value.is_empty() {
            return err_at!(InvalidValue, msg: "empty string is not a valid null-list value");
        }
        if value.bytes().any(|b| b == 0) {
            return err_at!(InvalidValue, msg: "null byte in null-list value {:?}", value);
        }
        let valid = value
            .bytes()
            .all(|b| b.is_ascii_alphabetic() || b == b'.');
        if !valid {
            return err_at!(
                InvalidValue,
                msg: "null-list value {:?} outside [A-Za-z.] alphabet",
                value
            );
        }
        Ok(())
    }
}

impl Serializer for NullListSerializer {
    type Value = String;

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Self::validate(value)?;
        Ok(value.replace('.', "\0").into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        let s = err_at!(FailConvert, std::str::from_utf8(bytes), "null-list serializer")?;
        let value = s.replace('\0', ".");
        Self::validate(&value)?;
        Ok(value)
    }
}

/// Selects which of this module's codecs an [crate::model::IndexDecl]
/// encodes its key with (§4.A: "the index's key order must equal the
/// domain's natural order"). Bound statically per declared index rather
/// than inferred from a value's runtime shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexSerializer {
    Numeric,
    Text,
    Datetime,
    NullList,
}

impl IndexSerializer {
    /// Encode `value` with the serializer this variant selects, failing
    /// with *invalid-value* if `value`'s shape doesn't match the domain
    /// the declared serializer expects.
    pub(crate) fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        match (self, value) {
            (IndexSerializer::Numeric, Value::Uint(v)) => NumericSerializer.encode(v),
            (IndexSerializer::Text, Value::Text(v)) => TextSerializer.encode(v),
            (IndexSerializer::NullList, Value::Text(v)) => NullListSerializer.encode(v),
            (IndexSerializer::Datetime, Value::Seconds(secs)) => {
                let dt = match Utc.timestamp_opt(*secs, 0).single() {
                    Some(dt) => dt,
                    None => return err_at!(InvalidValue, msg: "out of range timestamp {}", secs),
                };
                DatetimeSerializer.encode(&dt)
            }
            (kind, value) => err_at!(
                InvalidValue,
                msg: "index serializer {:?} cannot encode value {:?}",
                kind,
                value
            ),
        }
    }
}

#[cfg(test)]
#[path = "serializer_test.rs"]
mod serializer_test;
