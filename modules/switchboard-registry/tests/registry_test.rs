//! Registry contract tests.
//!
//! These verify the change-detection contract a snapshot feed relies on:
//! - new keys and real changes emit `updated` exactly once
//! - identical snapshots, volatile drift, and handle churn emit nothing
//! - removal emits `deleted` with the last-known record, exactly once
//! - `for_each` visits every current entity, and only current entities

use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use switchboard_registry::{ComparisonPolicy, Handle, Record, Registry};

/// Registry with a subscriber log: (event name, serialized payload).
fn observed() -> (Registry, Arc<Mutex<Vec<(String, Value)>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    let log = events.clone();
    registry.on_updated(move |record| {
        log.lock().unwrap().push(("updated".to_string(), record.to_json()));
    });
    let log = events.clone();
    registry.on_deleted(move |record| {
        log.lock().unwrap().push(("deleted".to_string(), record.to_json()));
    });
    (registry, events)
}

fn record(value: Value) -> Record {
    Record::from_json(value)
}

#[test]
fn insert_emits_updated_with_full_record() {
    let (mut registry, events) = observed();
    let fired = registry.update("foo", record(json!({"id": "foo", "x": 100, "y": ["a", "b", "c"]})));
    assert!(fired);
    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![(
            "updated".to_string(),
            json!({"id": "foo", "x": 100, "y": ["a", "b", "c"]})
        )]
    );
}

#[test]
fn update_is_idempotent() {
    let (mut registry, events) = observed();
    registry.update("foo", record(json!({"id": "foo", "x": 100})));
    let fired = registry.update("foo", record(json!({"id": "foo", "x": 100})));
    assert!(!fired);
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn volatile_drift_does_not_emit() {
    let created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let drifted = created + Duration::seconds(3);

    let (mut registry, events) = observed();
    registry.update(
        "foo",
        record(json!({"id": "foo", "creationTimestamp": created.to_rfc3339()})),
    );
    let fired = registry.update(
        "foo",
        record(json!({"id": "foo", "creationTimestamp": drifted.to_rfc3339()})),
    );
    assert!(!fired);
    assert_eq!(events.lock().unwrap().len(), 1);
    // The suppressed snapshot is not stored either.
    assert_eq!(
        registry.get("foo").unwrap().data("creationTimestamp"),
        Some(&json!(created.to_rfc3339()))
    );
}

#[test]
fn handle_churn_does_not_emit() {
    let (mut registry, events) = observed();
    registry.update(
        "conn-1",
        record(json!({"id": "conn-1"})).with_handle("close", Handle::new(|| {})),
    );
    let fired = registry.update(
        "conn-1",
        record(json!({"id": "conn-1"})).with_handle("close", Handle::new(|| {})),
    );
    assert!(!fired);
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn real_change_emits_new_record() {
    let (mut registry, events) = observed();
    registry.update("foo", record(json!({"id": "foo", "x": 100, "y": ["a", "b", "c"]})));
    registry.update("foo", record(json!({"id": "foo", "x": 100, "y": ["a", "b", "c"]})));
    let fired = registry.update("foo", record(json!({"id": "foo", "x": 100, "y": ["a", "b", "d"]})));
    assert!(fired);
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        (
            "updated".to_string(),
            json!({"id": "foo", "x": 100, "y": ["a", "b", "d"]})
        )
    );
}

#[test]
fn update_if_exists_ignores_unknown_keys() {
    let (mut registry, events) = observed();
    let fired = registry.update_if_exists("ghost", record(json!({"id": "ghost"})));
    assert!(!fired);
    assert!(events.lock().unwrap().is_empty());
    assert!(registry.get("ghost").is_none());
    assert!(registry.is_empty());
}

#[test]
fn update_if_exists_tracks_known_keys() {
    let (mut registry, events) = observed();
    registry.update("foo", record(json!({"id": "foo", "x": 1})));
    let fired = registry.update_if_exists("foo", record(json!({"id": "foo", "x": 2})));
    assert!(fired);
    assert_eq!(events.lock().unwrap().len(), 2);
}

#[test]
fn for_each_visits_every_entity() {
    let mut registry = Registry::new();
    for i in 0..5 {
        registry.update(format!("conn-{i}"), record(json!({"id": i, "sent": 10 * i})));
    }
    let mut total = 0;
    let mut visits = 0;
    registry.for_each(|record| {
        visits += 1;
        total += record.data("sent").and_then(Value::as_i64).unwrap_or(0);
    });
    assert_eq!(visits, 5);
    assert_eq!(total, 100);
}

#[test]
fn remove_emits_deleted_once_with_last_record() {
    let (mut registry, events) = observed();
    registry.update("foo", record(json!({"id": "foo", "x": 1})));
    let removed = registry.remove("foo");
    assert_eq!(removed.unwrap().data("x"), Some(&json!(1)));
    assert!(registry.remove("foo").is_none());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1], ("deleted".to_string(), json!({"id": "foo", "x": 1})));
    drop(events);

    // Gone for iteration and for update_if_exists.
    let mut visits = 0;
    registry.for_each(|_| visits += 1);
    assert_eq!(visits, 0);
    assert!(!registry.update_if_exists("foo", record(json!({"id": "foo", "x": 2}))));
}

#[test]
fn set_seeds_without_events() {
    let (mut registry, events) = observed();
    registry.set([
        ("a".to_string(), record(json!({"id": "a"}))),
        ("b".to_string(), record(json!({"id": "b"}))),
    ]);
    assert!(events.lock().unwrap().is_empty());
    assert_eq!(registry.len(), 2);

    // Seeded entries still participate in change detection afterwards.
    assert!(!registry.update("a", record(json!({"id": "a"}))));
    assert!(registry.update("a", record(json!({"id": "a", "x": 1}))));
}

#[test]
fn reconcile_diffs_against_full_snapshot() {
    let (mut registry, events) = observed();
    registry.update("a", record(json!({"id": "a", "x": 1})));
    registry.update("b", record(json!({"id": "b", "x": 2})));
    events.lock().unwrap().clear();

    // b changed, c new, a absent from the snapshot (gone).
    registry.reconcile([
        ("b".to_string(), record(json!({"id": "b", "x": 20}))),
        ("c".to_string(), record(json!({"id": "c", "x": 3}))),
    ]);

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            ("updated".to_string(), json!({"id": "b", "x": 20})),
            ("updated".to_string(), json!({"id": "c", "x": 3})),
            ("deleted".to_string(), json!({"id": "a", "x": 1})),
        ]
    );
    drop(events);
    assert_eq!(registry.len(), 2);
}

#[test]
fn late_subscriber_sees_no_replay() {
    let mut registry = Registry::new();
    registry.update("foo", record(json!({"id": "foo"})));

    let events = Arc::new(Mutex::new(Vec::new()));
    let log = events.clone();
    registry.on_updated(move |record| log.lock().unwrap().push(record.to_json()));
    assert!(events.lock().unwrap().is_empty());

    registry.update("foo", record(json!({"id": "foo", "x": 1})));
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn subscribers_run_in_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    for tag in ["first", "second", "third"] {
        let log = order.clone();
        registry.on_updated(move |_| log.lock().unwrap().push(tag));
    }
    registry.update("foo", record(json!({"id": "foo"})));
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn custom_policy_extends_volatile_set() {
    let policy = ComparisonPolicy::default().ignore("uptimeSeconds");
    let mut registry = Registry::with_policy(policy);
    registry.update("r1", record(json!({"id": "r1", "uptimeSeconds": 10})));
    assert!(!registry.update("r1", record(json!({"id": "r1", "uptimeSeconds": 70}))));
    assert!(registry.update("r1", record(json!({"id": "r1", "uptimeSeconds": 71, "role": "edge"}))));
}
