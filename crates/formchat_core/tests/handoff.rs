use std::sync::Once;

use chrono::{DateTime, Utc};
use formchat_core::{
    concatenate_selection, submit_selection, update, AppState, ConnectionState, Effect,
    EmptySelectionError, MessageId, MessageStore, Msg, Notice, NoticeKind, Selection,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

fn store_with(texts: &[&str]) -> (MessageStore, Vec<MessageId>) {
    let mut store = MessageStore::new();
    let ids = texts
        .iter()
        .enumerate()
        .map(|(i, t)| store.append(*t, i % 2 == 0, at(i as i64)))
        .collect();
    (store, ids)
}

fn message_ids(state: &AppState) -> Vec<MessageId> {
    state.view().messages.into_iter().map(|row| row.id).collect()
}

#[test]
fn empty_selection_always_fails() {
    let (store, _) = store_with(&["a", "b"]);
    assert_eq!(
        concatenate_selection(&Selection::new(), &store),
        Err(EmptySelectionError)
    );
    assert_eq!(
        concatenate_selection(&Selection::new(), &MessageStore::new()),
        Err(EmptySelectionError)
    );
}

#[test]
fn single_selection_has_no_separator_artifacts() {
    let (store, ids) = store_with(&["hello"]);
    let mut selection = Selection::new();
    selection.long_press(&ids[0], &store);

    assert_eq!(concatenate_selection(&selection, &store).unwrap(), "hello");
}

#[test]
fn texts_join_with_single_space_in_selection_order() {
    let (store, ids) = store_with(&["a", "b"]);
    let mut selection = Selection::new();
    selection.long_press(&ids[0], &store);
    selection.tap(&ids[1], &store);
    assert_eq!(concatenate_selection(&selection, &store).unwrap(), "a b");

    let mut reversed = Selection::new();
    reversed.long_press(&ids[1], &store);
    reversed.tap(&ids[0], &store);
    assert_eq!(concatenate_selection(&reversed, &store).unwrap(), "b a");
}

#[test]
fn blank_text_counts_as_empty() {
    let (store, ids) = store_with(&["  "]);
    let mut selection = Selection::new();
    selection.long_press(&ids[0], &store);

    assert_eq!(
        submit_selection(&selection, &store, "general"),
        Err(EmptySelectionError)
    );
}

#[test]
fn send_reply_select_submit_scenario() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(state, Msg::ConnectionChanged(ConnectionState::Open));
    let (state, _) = update(state, Msg::ComposeChanged("BP 120/80".to_string()));
    let (state, effects) = update(state, Msg::SendClicked { at: at(0) });
    assert_eq!(
        effects,
        vec![Effect::SendMessage {
            text: "BP 120/80".to_string()
        }]
    );
    let (state, _) = update(
        state,
        Msg::RemoteMessageReceived {
            text: "Noted".to_string(),
            at: at(1),
        },
    );

    let ids = message_ids(&state);
    let (state, _) = update(state, Msg::MessageLongPressed(ids[0].clone()));
    let (state, _) = update(state, Msg::MessageTapped(ids[1].clone()));
    let (state, effects) = update(
        state,
        Msg::HandoffRequested {
            template_code: "general".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::RequestExtraction {
            template_code: "general".to_string(),
            text: "BP 120/80 Noted".to_string(),
        }]
    );
    assert!(state.view().handoff_pending);
    assert_eq!(state.selection().len(), 2);

    let mut fields = Map::new();
    fields.insert("vitals".to_string(), json!({ "bp": "120/80" }));
    let (state, effects) = update(
        state,
        Msg::ExtractionCompleted {
            template_code: "general".to_string(),
            result: Ok(fields),
        },
    );

    assert!(state.selection().is_empty());
    assert_eq!(
        effects,
        vec![Effect::OpenFormEditor {
            template_code: "general".to_string()
        }]
    );
    let draft = state.view().draft.expect("draft opened");
    assert_eq!(draft.template_code, "general");
    assert_eq!(draft.data["vitals"]["bp"], Value::from("120/80"));
    assert!(!state.view().handoff_pending);
}

#[test]
fn submit_with_nothing_selected_blocks_with_notice() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::ComposeChanged("hi".to_string()));
    let (state, _) = update(state, Msg::SendClicked { at: at(0) });

    let (state, effects) = update(
        state,
        Msg::HandoffRequested {
            template_code: "general".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(
        state.view().notice.map(|n| n.kind),
        Some(NoticeKind::EmptySelection)
    );
}

#[test]
fn failed_extraction_keeps_selection_for_retry() {
    let (state, _) = update(AppState::new(), Msg::ComposeChanged("pulse 72".to_string()));
    let (state, _) = update(state, Msg::SendClicked { at: at(0) });
    let id = message_ids(&state)[0].clone();
    let (state, _) = update(state, Msg::MessageLongPressed(id.clone()));
    let (state, _) = update(
        state,
        Msg::HandoffRequested {
            template_code: "general".to_string(),
        },
    );

    let (state, effects) = update(
        state,
        Msg::ExtractionCompleted {
            template_code: "general".to_string(),
            result: Err(Notice::network("Extraction failed: http status 502")),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.selection().ids(), &[id]);
    assert!(state.view().draft.is_none());
    assert_eq!(state.view().notice.unwrap().kind, NoticeKind::Network);

    // Retry is allowed once the previous attempt resolved.
    let (_, effects) = update(
        state,
        Msg::HandoffRequested {
            template_code: "general".to_string(),
        },
    );
    assert_eq!(effects.len(), 1);
}

#[test]
fn repeat_submit_while_pending_is_ignored() {
    let (state, _) = update(AppState::new(), Msg::ComposeChanged("a".to_string()));
    let (state, _) = update(state, Msg::SendClicked { at: at(0) });
    let id = message_ids(&state)[0].clone();
    let (state, _) = update(state, Msg::MessageLongPressed(id));
    let submit = Msg::HandoffRequested {
        template_code: "general".to_string(),
    };
    let (state, first) = update(state, submit.clone());
    let (_, second) = update(state, submit);

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn blank_template_code_is_a_validation_error() {
    let (state, _) = update(AppState::new(), Msg::ComposeChanged("a".to_string()));
    let (state, _) = update(state, Msg::SendClicked { at: at(0) });
    let id = message_ids(&state)[0].clone();
    let (state, _) = update(state, Msg::MessageLongPressed(id));

    let (state, effects) = update(
        state,
        Msg::HandoffRequested {
            template_code: "  ".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.view().notice.unwrap().kind, NoticeKind::Validation);
    assert_eq!(state.selection().len(), 1);
}
