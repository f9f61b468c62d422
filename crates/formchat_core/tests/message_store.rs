use chrono::{DateTime, Utc};
use formchat_core::MessageStore;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).expect("valid timestamp")
}

#[test]
fn all_returns_entries_in_append_order() {
    let mut store = MessageStore::new();
    let texts = ["BP 120/80", "Noted", "pulse 72", "ok", "temp 37.2"];
    let ids: Vec<_> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| store.append(*text, i % 2 == 0, at(i as i64)))
        .collect();

    let listed: Vec<_> = store.all().iter().map(|m| m.text()).collect();
    assert_eq!(listed, texts);
    let listed_ids: Vec<_> = store.all().iter().map(|m| m.id().clone()).collect();
    assert_eq!(listed_ids, ids);
    assert_eq!(store.len(), 5);
}

#[test]
fn ids_are_unique_per_append() {
    let mut store = MessageStore::new();
    let a = store.append("same", true, at(0));
    let b = store.append("same", true, at(0));

    assert_ne!(a, b);
    assert_eq!(store.get(&a).unwrap().text(), "same");
    assert!(store.contains(&b));
}

#[test]
fn timestamps_never_go_backwards() {
    let mut store = MessageStore::new();
    store.append("late network reply", false, at(10));
    store.append("clock skewed input", true, at(5));

    let stamps: Vec<_> = store.all().iter().map(|m| m.timestamp()).collect();
    assert_eq!(stamps, vec![at(10), at(10)]);
}

#[test]
fn restore_skips_known_ids() {
    let mut source = MessageStore::new();
    source.append("hello", true, at(0));
    let snapshot = source.all().to_vec();

    let mut store = MessageStore::new();
    assert!(store.restore(snapshot[0].clone()));
    assert!(!store.restore(snapshot[0].clone()));
    assert_eq!(store.len(), 1);
}

#[test]
fn restore_after_live_append_keeps_timestamps_monotonic() {
    let mut source = MessageStore::new();
    source.append("cached earlier", true, at(1));
    let cached = source.all()[0].clone();

    let mut store = MessageStore::new();
    store.append("live reply", false, at(30));
    assert!(store.restore(cached));

    let stamps: Vec<_> = store.all().iter().map(|m| m.timestamp()).collect();
    assert_eq!(stamps, vec![at(30), at(30)]);
}

#[test]
fn clear_drops_everything() {
    let mut store = MessageStore::new();
    let id = store.append("hello", true, at(0));
    store.clear();

    assert!(store.is_empty());
    assert!(store.get(&id).is_none());
}

#[test]
fn message_serializes_with_wire_field_names() {
    let mut store = MessageStore::new();
    store.append("hello", true, at(0));
    let value = serde_json::to_value(&store.all()[0]).unwrap();

    assert_eq!(value["text"], "hello");
    assert_eq!(value["isUser"], true);
    assert!(value["id"].is_string());
    assert!(value["timestamp"].as_str().unwrap().starts_with("2023-11-14T"));
}
