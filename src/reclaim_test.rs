use tempfile::tempdir;

use std::collections::BTreeMap;

use crate::{Engine, EngineConfig, IndexSerializer, ModelDescriptor, Value};

fn open_engine(model: ModelDescriptor) -> (tempfile::TempDir, Engine) {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), model, EngineConfig::new()).unwrap();
    (dir, engine)
}

fn fields(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
}

#[test]
fn test_purge_with_no_readers_is_a_noop() {
    let (_dir, engine) = open_engine(ModelDescriptor::new("events"));
    engine.create(fields(&[])).unwrap();

    assert_eq!(engine.purge().unwrap(), (0, 0));
}

#[test]
fn test_remove_with_no_readers_fails_reader_not_found() {
    let (_dir, engine) = open_engine(ModelDescriptor::new("events"));
    let entry = engine.create(fields(&[])).unwrap();

    match engine.remove(&entry) {
        Err(crate::Error::ReaderNotFound(..)) => (),
        other => panic!("expected reader-not-found, got {:?}", other),
    }
}

#[test]
fn test_remove_unsaved_entry_fails_invalid_value() {
    let (_dir, engine) = open_engine(ModelDescriptor::new("events"));
    let unsaved = crate::Entry::new(BTreeMap::new());

    match engine.remove(&unsaved) {
        Err(crate::Error::InvalidValue(..)) => (),
        other => panic!("expected invalid-value, got {:?}", other),
    }
}

#[test]
fn test_remove_waits_for_every_reader_to_ack() {
    let (_dir, engine) = open_engine(ModelDescriptor::new("events"));
    let entry = engine.create(fields(&[])).unwrap();
    engine.register_reader("r1").unwrap();
    engine.register_reader("r2").unwrap();

    {
        let mut r1 = engine.reader(Some("r1")).unwrap();
        r1.ack(0u64).unwrap();
        r1.commit().unwrap();
    }

    // r2 hasn't acked yet: remove must refuse.
    assert_eq!(engine.remove(&entry).unwrap(), false);

    {
        let mut r2 = engine.reader(Some("r2")).unwrap();
        r2.ack(0u64).unwrap();
        r2.commit().unwrap();
    }

    assert_eq!(engine.remove(&entry).unwrap(), true);

    // The entry is gone: a second remove call can no longer find it.
    let reader = engine.reader(None).unwrap();
    assert!(reader.get(0).is_err());
}

#[test]
fn test_remove_deletes_index_edges() {
    let model = ModelDescriptor::new("events").with_index("by_kind", "kind", IndexSerializer::Text, false);
    let (_dir, engine) = open_engine(model);

    let entry = engine
        .create(fields(&[("kind", Value::Text("login".to_string()))]))
        .unwrap();
    engine.register_reader("r1").unwrap();
    {
        let mut r1 = engine.reader(Some("r1")).unwrap();
        r1.ack(0u64).unwrap();
        r1.commit().unwrap();
    }

    assert_eq!(engine.remove(&entry).unwrap(), true);
    let pks = engine
        .lookup("by_kind", &Value::Text("login".to_string()))
        .unwrap();
    assert!(pks.is_empty());
}

// Literal end-to-end scenario 4 (§8): two readers, partial overlap, purge
// only removes the pks both have acked.
#[test]
fn test_purge_removes_only_common_intersection() {
    let (_dir, engine) = open_engine(ModelDescriptor::new("events"));

    for _ in 0..3 {
        engine.create(fields(&[])).unwrap();
    }
    engine.register_reader("r1").unwrap();
    engine.register_reader("r2").unwrap();

    {
        let mut r1 = engine.reader(Some("r1")).unwrap();
        r1.ack(0u64).unwrap();
        r1.ack(1u64).unwrap();
        r1.commit().unwrap();
    }
    {
        let mut r2 = engine.reader(Some("r2")).unwrap();
        r2.ack(0u64).unwrap();
        r2.commit().unwrap();
    }

    // only pk 0 is acked by both readers.
    let (removed, errors) = engine.purge().unwrap();
    assert_eq!(removed, 1);
    assert_eq!(errors, 0);

    let reader = engine.reader(None).unwrap();
    assert!(reader.get(0).is_err());
    assert!(reader.get(1).is_ok());
    assert!(reader.get(2).is_ok());
}

#[test]
fn test_purge_is_idempotent_once_drained() {
    let (_dir, engine) = open_engine(ModelDescriptor::new("events"));
    engine.create(fields(&[])).unwrap();
    engine.register_reader("r1").unwrap();
    {
        let mut r1 = engine.reader(Some("r1")).unwrap();
        r1.ack(0u64).unwrap();
        r1.commit().unwrap();
    }

    assert_eq!(engine.purge().unwrap(), (1, 0));
    assert_eq!(engine.purge().unwrap(), (0, 0));
}
