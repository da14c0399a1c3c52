//! State document round-trips and the explicit open/close lifecycle.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use promstore_core::{
    Command, CorruptStatePolicy, InMemoryStore, MetricStorage, StateDocument, StateFile, StoreError,
};

use fixtures::{counter, family, flat, gauge, observe, row};

fn populated(store: &InMemoryStore) {
    store.update_counter(&counter("c_total", &["k"], &["b"], 2.0)).unwrap();
    store.update_counter(&counter("c_total", &["k"], &["a:b"], 1.0)).unwrap();
    store.update_gauge(&gauge("g", &["sum"], Command::Set, -3.25)).unwrap();
    store.update_histogram(&observe("h", &[0.1, 1.0, 2.5], &["x"], 0.05)).unwrap();
    store.update_histogram(&observe("h", &[0.1, 1.0, 2.5], &["x"], 7.0)).unwrap();
    store.update_histogram(&observe("h", &[0.1, 1.0, 2.5], &["y"], 2.5)).unwrap();
}

#[test]
fn close_then_open_reproduces_collect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = InMemoryStore::open(Some(StateFile::new(&path))).unwrap();
    populated(&store);
    let before = store.collect().unwrap();
    store.close().unwrap();
    drop(store);

    let reopened = InMemoryStore::open(Some(StateFile::new(&path))).unwrap();
    assert_eq!(reopened.collect().unwrap(), before);

    // a reloaded store keeps accumulating on top of the persisted state
    reopened.update_counter(&counter("c_total", &["k"], &["b"], 1.0)).unwrap();
    let families = reopened.collect().unwrap();
    assert_eq!(
        flat(&family(&families, "c_total").samples),
        vec![row("c_total", &["a:b"], 1.0), row("c_total", &["b"], 3.0)]
    );
}

#[test]
fn document_round_trip_through_json() {
    let store = InMemoryStore::new();
    populated(&store);
    let doc = store.snapshot().unwrap();
    assert_eq!(doc.counters.len(), 1);
    assert_eq!(doc.gauges.len(), 1);
    assert_eq!(doc.histograms.len(), 1);

    let raw = serde_json::to_string(&doc).unwrap();
    let parsed: StateDocument = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, doc);

    let restored = InMemoryStore::from_document(&parsed).unwrap();
    assert_eq!(restored.collect().unwrap(), store.collect().unwrap());
}

#[test]
fn dropping_a_store_does_not_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    {
        let store = InMemoryStore::open(Some(StateFile::new(&path))).unwrap();
        populated(&store);
    }
    assert!(!path.exists());
}

#[test]
fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = InMemoryStore::open(Some(StateFile::new(dir.path().join("none.json")))).unwrap();
    assert!(store.collect().unwrap().is_empty());
}

#[test]
fn corrupt_file_follows_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, b"{ not json").unwrap();

    let err = InMemoryStore::open(Some(StateFile::new(&path))).expect_err("fail fast by default");
    assert!(matches!(err, StoreError::Persistence(_)));

    let store = InMemoryStore::open(Some(
        StateFile::new(&path).with_policy(CorruptStatePolicy::StartEmpty),
    ))
    .unwrap();
    assert!(store.collect().unwrap().is_empty());
}

#[test]
fn inconsistent_document_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    // counter entry filed under gauges
    fs::write(
        &path,
        r#"{"counters":{},"gauges":{"[\"counter\",\"c\"]":{"meta":{"name":"c","help":"","type":"counter","labelNames":[]},"samples":{}}},"histograms":{}}"#,
    )
    .unwrap();
    let err = InMemoryStore::open(Some(StateFile::new(&path))).expect_err("misfiled entry");
    assert!(matches!(err, StoreError::InvalidMetricData(_)));

    // histogram sample on an undeclared bound
    fs::write(
        &path,
        r#"{"histograms":{"[\"histogram\",\"h\"]":{"meta":{"name":"h","type":"histogram","buckets":[1]},"samples":{"[\"histogram\",\"h\",[],\"2\"]":1}}}}"#,
    )
    .unwrap();
    assert!(InMemoryStore::open(Some(StateFile::new(&path))).is_err());

    let store = InMemoryStore::open(Some(
        StateFile::new(&path).with_policy(CorruptStatePolicy::StartEmpty),
    ))
    .unwrap();
    assert!(store.collect().unwrap().is_empty());
}

#[test]
fn rejected_overflow_keeps_state_reloadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = InMemoryStore::open(Some(StateFile::new(&path))).unwrap();
    store.update_counter(&counter("c_total", &[], &[], f64::MAX)).unwrap();
    assert!(store.update_counter(&counter("c_total", &[], &[], f64::MAX)).is_err());
    let before = store.collect().unwrap();
    store.close().unwrap();

    let reopened = InMemoryStore::open(Some(StateFile::new(&path))).unwrap();
    assert_eq!(reopened.collect().unwrap(), before);
}

#[test]
fn duplicate_decoded_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    // "1" and "1.0" name the same bucket bound
    fs::write(
        &path,
        r#"{"histograms":{"[\"histogram\",\"h\"]":{"meta":{"name":"h","help":"","type":"histogram","labelNames":[],"buckets":[1]},"samples":{"[\"histogram\",\"h\",[],\"1\"]":1,"[\"histogram\",\"h\",[],\"1.0\"]":2}}}}"#,
    )
    .unwrap();
    let err = InMemoryStore::open(Some(StateFile::new(&path))).expect_err("duplicate bucket");
    assert!(matches!(err, StoreError::InvalidMetricData(_)));

    // two spellings of one identity key
    fs::write(
        &path,
        r#"{"counters":{"[\"counter\",\"c\"]":{"meta":{"name":"c","help":"","type":"counter","labelNames":[]},"samples":{}},"[\"counter\", \"c\"]":{"meta":{"name":"c","help":"","type":"counter","labelNames":[]},"samples":{}}}}"#,
    )
    .unwrap();
    let err = InMemoryStore::open(Some(StateFile::new(&path))).expect_err("duplicate identity");
    assert!(matches!(err, StoreError::InvalidMetricData(_)));
}

#[test]
fn loads_state_vector() {
    let store =
        InMemoryStore::open(Some(StateFile::new("tests/vectors/state_v1.json"))).unwrap();
    let families = store.collect().unwrap();
    assert_eq!(families.len(), 3);

    assert_eq!(
        flat(&family(&families, "test_some_counter").samples),
        vec![row("test_some_counter", &["blue"], 3.0)]
    );
    assert_eq!(
        flat(&family(&families, "test_some_gauge").samples),
        vec![row("test_some_gauge", &["blue"], 2.5)]
    );

    let h = flat(&family(&families, "test_some_histogram").samples);
    assert_eq!(h.len(), 13);
    assert_eq!(h[0], row("test_some_histogram_bucket", &["blue", "0.1"], 0.0));
    assert_eq!(h[2], row("test_some_histogram_bucket", &["blue", "2"], 0.0));
    assert_eq!(h[3], row("test_some_histogram_bucket", &["blue", "3.5"], 1.0));
    assert_eq!(h[10], row("test_some_histogram_bucket", &["blue", "+Inf"], 1.0));
    assert_eq!(h[11], row("test_some_histogram_count", &["blue"], 1.0));
    assert_eq!(h[12], row("test_some_histogram_sum", &["blue"], 3.5));
}
