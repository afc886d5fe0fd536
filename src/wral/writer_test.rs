use tempfile::tempdir;

use crate::Error;

use super::*;

fn open_writer(dir: &std::path::Path, max_log_events: u64) -> Writer {
    let config = Config::new("mylog", dir.as_os_str()).set_max_log_events(max_log_events);
    Writer::open(config).unwrap()
}

#[test]
fn test_append_stays_in_one_segment_until_full() {
    let dir = tempdir().unwrap();
    let mut writer = open_writer(dir.path(), 10);

    for i in 0..10 {
        let (segment, recno) = writer.append(format!("rec-{}", i).into_bytes()).unwrap();
        assert_eq!(segment, 1);
        assert_eq!(recno, (i + 1) as u64);
    }
}

#[test]
fn test_rotation_is_deferred_to_next_append() {
    let dir = tempdir().unwrap();
    let mut writer = open_writer(dir.path(), 10);

    for i in 0..10 {
        writer.append(format!("rec-{}", i).into_bytes()).unwrap();
    }
    // the 10th append filled segment 1 but did not yet rotate.
    assert!(writer.next_will_rotate);

    let (segment, recno) = writer.append(b"overflow".to_vec()).unwrap();
    assert_eq!(segment, 2);
    assert_eq!(recno, 1);
}

#[test]
fn test_25_records_at_max_10_makes_3_segments() {
    let dir = tempdir().unwrap();
    let mut writer = open_writer(dir.path(), 10);

    let mut segments = std::collections::BTreeSet::new();
    for i in 0..25 {
        let (segment, _) = writer.append(format!("rec-{}", i).into_bytes()).unwrap();
        segments.insert(segment);
    }
    assert_eq!(segments, [1, 2, 3].into_iter().collect());
}

#[test]
fn test_delete_refused_for_current_segment() {
    let dir = tempdir().unwrap();
    let mut writer = open_writer(dir.path(), 10);
    writer.append(b"one".to_vec()).unwrap();

    match writer.delete(1) {
        Err(Error::IllegalState(..)) => (),
        other => panic!("expected illegal-state, got {:?}", other),
    }
}

#[test]
fn test_delete_refused_for_missing_segment() {
    let dir = tempdir().unwrap();
    let mut writer = open_writer(dir.path(), 10);
    writer.append(b"one".to_vec()).unwrap();

    match writer.delete(99) {
        Err(Error::NotFound(..)) => (),
        other => panic!("expected not-found, got {:?}", other),
    }
}

#[test]
fn test_delete_refused_while_reader_still_inside_segment() {
    let dir = tempdir().unwrap();
    let mut writer = open_writer(dir.path(), 10);
    for i in 0..25 {
        writer.append(format!("rec-{}", i).into_bytes()).unwrap();
    }

    let mut reader = Reader::open(dir.path().as_os_str(), "mylog", "r1").unwrap();
    // reader has not read anything yet: still positioned inside segment 1.
    match writer.delete(1) {
        Err(Error::IllegalState(..)) => (),
        other => panic!("expected illegal-state, got {:?}", other),
    }

    // advance the reader past segment 1 (10 records).
    for _ in 0..10 {
        reader.next_record().unwrap().unwrap();
    }
    writer.delete(1).unwrap();
}
