use chrono::{DateTime, Utc};
use formchat_core::{MessageId, MessageStore, Selection};

fn store_with(texts: &[&str]) -> (MessageStore, Vec<MessageId>) {
    let mut store = MessageStore::new();
    let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
    let ids = texts.iter().map(|t| store.append(*t, true, at)).collect();
    (store, ids)
}

#[test]
fn long_press_then_tap_same_id_clears_selection() {
    let (store, ids) = store_with(&["a"]);
    let mut selection = Selection::new();

    assert!(selection.long_press(&ids[0], &store));
    assert!(selection.tap(&ids[0], &store));
    assert!(selection.is_empty());
}

#[test]
fn long_press_replaces_never_unions() {
    let (store, ids) = store_with(&["a", "b"]);
    let mut selection = Selection::new();

    selection.long_press(&ids[0], &store);
    selection.long_press(&ids[1], &store);
    assert_eq!(selection.ids(), &[ids[1].clone()]);
}

#[test]
fn tap_on_empty_selection_does_not_start_selection() {
    let (store, ids) = store_with(&["a"]);
    let mut selection = Selection::new();

    assert!(!selection.tap(&ids[0], &store));
    assert!(selection.is_empty());
}

#[test]
fn tap_toggles_and_keeps_insertion_order() {
    let (store, ids) = store_with(&["a", "b", "c"]);
    let mut selection = Selection::new();

    selection.long_press(&ids[2], &store);
    selection.tap(&ids[0], &store);
    selection.tap(&ids[1], &store);
    assert_eq!(selection.ids(), &[ids[2].clone(), ids[0].clone(), ids[1].clone()]);

    selection.tap(&ids[0], &store);
    assert_eq!(selection.ids(), &[ids[2].clone(), ids[1].clone()]);
}

#[test]
fn unknown_ids_are_ignored() {
    let (store, ids) = store_with(&["a"]);
    let mut selection = Selection::new();
    let ghost = MessageId::from("not-in-store");

    assert!(!selection.long_press(&ghost, &store));
    selection.long_press(&ids[0], &store);
    assert!(!selection.tap(&ghost, &store));
    assert_eq!(selection.len(), 1);
}

#[test]
fn cancel_and_retain_existing_clear_dangling_ids() {
    let (mut store, ids) = store_with(&["a", "b"]);
    let mut selection = Selection::new();
    selection.long_press(&ids[0], &store);
    selection.tap(&ids[1], &store);

    store.clear();
    selection.retain_existing(&store);
    assert!(selection.is_empty());

    let (store, ids) = store_with(&["c"]);
    selection.long_press(&ids[0], &store);
    selection.cancel();
    assert!(!selection.contains(&ids[0]));
}
