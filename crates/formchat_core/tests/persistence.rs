use chrono::{DateTime, Utc};
use formchat_core::{update, AppState, Msg};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

#[test]
fn mirrored_messages_can_be_restored() {
    init_logging();
    let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
    let state = AppState::new().with_write_through(true);
    let (state, _) = update(state, Msg::ComposeChanged("BP 120/80".to_string()));
    let (state, _) = update(state, Msg::SendClicked { at });
    let (state, _) = update(
        state,
        Msg::RemoteMessageReceived {
            text: "Noted".to_string(),
            at,
        },
    );

    let snapshot = state.messages_snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let decoded = serde_json::from_str(&json).unwrap();

    let (restored, effects) = update(AppState::new(), Msg::RestoreMessages(decoded));
    assert!(effects.is_empty());
    let view = restored.view();
    assert_eq!(view.messages.len(), 2);
    assert_eq!(view.messages[0].text, "BP 120/80");
    assert!(view.messages[0].is_user);
    assert!(!view.messages[1].is_user);
    assert_eq!(restored.messages_snapshot(), snapshot);
}

#[test]
fn restoring_twice_does_not_duplicate() {
    init_logging();
    let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
    let (state, _) = update(AppState::new(), Msg::ComposeChanged("hello".to_string()));
    let (state, _) = update(state, Msg::SendClicked { at });
    let snapshot = state.messages_snapshot();

    let (state, _) = update(AppState::new(), Msg::RestoreMessages(snapshot.clone()));
    let (mut state, _) = update(state, Msg::RestoreMessages(snapshot));
    assert_eq!(state.view().messages.len(), 1);
    assert!(state.consume_dirty());
}
