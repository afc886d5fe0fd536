use super::*;

#[test]
fn test_builder_defaults() {
    let cfg = Config::new("mylog", ffi::OsStr::new("/tmp/mylog"));
    assert_eq!(cfg.max_log_events, MAX_LOG_EVENTS);
    assert!(!cfg.fsync);
}

#[test]
fn test_builder_overrides() {
    let cfg = Config::new("mylog", ffi::OsStr::new("/tmp/mylog"))
        .set_max_log_events(10)
        .set_fsync(true);
    assert_eq!(cfg.max_log_events, 10);
    assert!(cfg.fsync);
}
