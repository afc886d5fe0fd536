use arbitrary::{Arbitrary, Unstructured};
use chrono::{TimeZone, Utc};

use std::collections::BTreeMap;

use super::*;

fn unstructured(seed: &[u8]) -> Unstructured {
    Unstructured::new(seed)
}

#[test]
fn test_numeric_round_trip() {
    let seeds: &[&[u8]] = &[&[1, 2, 3, 4], &[0xff; 16], &[0; 1], &[7; 9]];
    for seed in seeds {
        let mut u = unstructured(seed);
        let val = u64::arbitrary(&mut u).unwrap();
        let bytes = NumericSerializer.encode(&val).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(NumericSerializer.decode(&bytes).unwrap(), val);
    }
}

#[test]
fn test_numeric_order_preserving() {
    let (a, b) = (1_u64, 256_u64);
    let (ea, eb) = (
        NumericSerializer.encode(&a).unwrap(),
        NumericSerializer.encode(&b).unwrap(),
    );
    assert_eq!(a.cmp(&b), ea.cmp(&eb));
}

#[test]
fn test_text_round_trip() {
    for val in ["", "hello", "unicode: héllo wörld", "x".repeat(511).as_str()] {
        let bytes = TextSerializer.encode(&val.to_string()).unwrap();
        assert_eq!(TextSerializer.decode(&bytes).unwrap(), val);
    }
}

#[test]
fn test_text_order_preserving() {
    let (a, b) = ("alpha".to_string(), "beta".to_string());
    let (ea, eb) = (
        TextSerializer.encode(&a).unwrap(),
        TextSerializer.encode(&b).unwrap(),
    );
    assert_eq!(a.cmp(&b), ea.cmp(&eb));
}

#[test]
fn test_object_round_trip() {
    let mut obj = BTreeMap::new();
    obj.insert("test".to_string(), Value::Text("data".to_string()));
    obj.insert("count".to_string(), Value::Uint(7));
    let val = Value::Object(obj);

    let bytes = ObjectSerializer.encode(&val).unwrap();
    assert_eq!(ObjectSerializer.decode(&bytes).unwrap(), val);
}

#[test]
fn test_datetime_round_trip() {
    let val = Utc.with_ymd_and_hms(2021, 3, 14, 9, 26, 53).unwrap();
    let bytes = DatetimeSerializer.encode(&val).unwrap();
    assert_eq!(DatetimeSerializer.decode(&bytes).unwrap(), val);
}

#[test]
fn test_datetime_order_preserving() {
    let a = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    let b = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let (ea, eb) = (
        DatetimeSerializer.encode(&a).unwrap(),
        DatetimeSerializer.encode(&b).unwrap(),
    );
    assert_eq!(a.cmp(&b), ea.cmp(&eb));
}

#[test]
fn test_datetime_rejects_pre_1970() {
    let val = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap();
    match DatetimeSerializer.encode(&val) {
        Err(Error::InvalidValue(..)) => (),
        other => panic!("expected invalid-value, got {:?}", other),
    }
}

#[test]
fn test_nulllist_round_trip() {
    // literal scenario from the source test suite.
    let val = "hello.world".to_string();
    let bytes = NullListSerializer.encode(&val).unwrap();
    assert_eq!(NullListSerializer.decode(&bytes).unwrap(), val);

    let val = "helloworld".to_string();
    let bytes = NullListSerializer.encode(&val).unwrap();
    assert_eq!(NullListSerializer.decode(&bytes).unwrap(), val);
}

#[test]
fn test_nulllist_order_preserving() {
    let (a, b) = ("alpha.one".to_string(), "alpha.two".to_string());
    let (ea, eb) = (
        NullListSerializer.encode(&a).unwrap(),
        NullListSerializer.encode(&b).unwrap(),
    );
    assert_eq!(a.cmp(&b), ea.cmp(&eb));
}

#[test]
fn test_nulllist_rejects_empty_string() {
    match NullListSerializer.encode(&"".to_string()) {
        Err(Error::InvalidValue(..)) => (),
        other => panic!("expected invalid-value, got {:?}", other),
    }
}

#[test]
fn test_nulllist_rejects_embedded_nul() {
    match NullListSerializer.encode(&"test\0".to_string()) {
        Err(Error::InvalidValue(..)) => (),
        other => panic!("expected invalid-value, got {:?}", other),
    }
}

#[test]
fn test_nulllist_rejects_outside_alphabet() {
    match NullListSerializer.encode(&"ñoño".to_string()) {
        Err(Error::InvalidValue(..)) => (),
        other => panic!("expected invalid-value, got {:?}", other),
    }
}
