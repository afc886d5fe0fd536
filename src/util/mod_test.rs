use cbordata::Cborize;

use super::*;

#[derive(Clone, Debug, PartialEq, Cborize)]
struct Sample {
    a: u64,
    b: String,
}

impl Sample {
    const ID: u32 = 0x0001;
}

#[test]
fn test_cbor_round_trip() {
    let val = Sample {
        a: 42,
        b: "hello".to_string(),
    };

    let bytes = into_cbor_bytes(val.clone()).expect("encode");
    let (back, n): (Sample, usize) = from_cbor_bytes(&bytes).expect("decode");

    assert_eq!(val, back);
    assert_eq!(n, bytes.len());
}

#[test]
fn test_join_dir() {
    let base = path::Path::new("/tmp/base");
    let rel = ffi::OsStr::new("data");
    assert_eq!(join_dir(base, rel), path::PathBuf::from("/tmp/base/data"));
}
