use chrono::{DateTime, Utc};
use formchat_core::{update, AppState, ConnectionState, Effect, Msg, NoticeKind};
use pretty_assertions::assert_eq;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

fn send(state: AppState, text: &str, secs: i64) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::ComposeChanged(text.to_string()));
    update(state, Msg::SendClicked { at: at(secs) })
}

#[test]
fn screen_opened_connects_and_loads_catalog() {
    let (_, effects) = update(AppState::new(), Msg::ScreenOpened);
    assert_eq!(
        effects,
        vec![Effect::Connect, Effect::LoadTemplates, Effect::LoadForms]
    );

    let (state, _) = update(AppState::new(), Msg::ConnectionChanged(ConnectionState::Open));
    let (_, effects) = update(state, Msg::ScreenOpened);
    assert_eq!(effects, vec![Effect::LoadTemplates, Effect::LoadForms]);
}

#[test]
fn send_while_disconnected_reconnects_first() {
    let (mut state, effects) = send(AppState::new(), "  BP 120/80 ", 0);

    assert_eq!(
        effects,
        vec![
            Effect::Connect,
            Effect::SendMessage {
                text: "BP 120/80".to_string()
            },
        ]
    );
    let view = state.view();
    assert_eq!(view.compose, "");
    assert_eq!(view.messages.len(), 1);
    assert!(view.messages[0].is_user);
    assert!(state.consume_dirty());
}

#[test]
fn send_while_connecting_does_not_reconnect() {
    let (state, _) = update(
        AppState::new(),
        Msg::ConnectionChanged(ConnectionState::Connecting),
    );
    let (_, effects) = send(state, "hi", 0);
    assert_eq!(
        effects,
        vec![Effect::SendMessage {
            text: "hi".to_string()
        }]
    );
}

#[test]
fn blank_send_is_ignored() {
    let (mut state, effects) = send(AppState::new(), "   ", 0);
    assert!(effects.is_empty());
    assert!(state.view().messages.is_empty());
    assert!(state.consume_dirty());
    let (mut state, _) = update(state, Msg::SendClicked { at: at(1) });
    assert!(!state.consume_dirty());
}

#[test]
fn messages_render_in_event_order() {
    let (state, _) = send(AppState::new(), "first", 5);
    let (state, _) = update(
        state,
        Msg::RemoteMessageReceived {
            text: "reply".to_string(),
            at: at(3),
        },
    );
    let (state, _) = send(state, "third", 4);

    let rows = state.view().messages;
    let texts: Vec<_> = rows.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "reply", "third"]);
    assert!(!rows[1].is_user);
    assert!(rows.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn write_through_mirrors_after_every_append() {
    let state = AppState::new().with_write_through(true);
    let (state, effects) = send(state, "hello", 0);
    let snapshot = state.messages_snapshot();
    assert_eq!(effects.last(), Some(&Effect::MirrorMessages(snapshot)));

    let (state, effects) = update(
        state,
        Msg::RemoteMessageReceived {
            text: "hi".to_string(),
            at: at(1),
        },
    );
    assert_eq!(effects, vec![Effect::MirrorMessages(state.messages_snapshot())]);
}

#[test]
fn connection_failure_closes_and_raises_notice() {
    let (state, _) = update(AppState::new(), Msg::ConnectionChanged(ConnectionState::Open));
    let (state, effects) = update(
        state,
        Msg::ConnectionFailed {
            reason: "connection reset".to_string(),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.connection, ConnectionState::Closed);
    assert_eq!(view.notice.as_ref().unwrap().kind, NoticeKind::Network);

    let (state, _) = update(state, Msg::NoticeDismissed);
    assert!(state.view().notice.is_none());
    let (_, effects) = send(state, "again", 1);
    assert_eq!(effects[0], Effect::Connect);
}

#[test]
fn screen_closed_drops_messages_and_selection() {
    let (state, _) = send(AppState::new(), "hello", 0);
    let id = state.view().messages[0].id.clone();
    let (state, _) = update(state, Msg::MessageLongPressed(id));
    assert!(state.view().selection_mode);

    let (state, effects) = update(state, Msg::ScreenClosed);
    assert_eq!(effects, vec![Effect::Disconnect]);
    let view = state.view();
    assert!(view.messages.is_empty());
    assert!(view.selection.is_empty());
    assert!(!view.selection_mode);
}

#[test]
fn listen_toggle_requires_speech_support() {
    let (state, effects) = update(AppState::new(), Msg::ListenToggled);
    assert!(effects.is_empty());
    assert_eq!(state.view().notice.unwrap().kind, NoticeKind::Speech);

    let (state, _) = update(AppState::new(), Msg::SpeechCapabilityDetected(true));
    let (state, effects) = update(state, Msg::ListenToggled);
    assert_eq!(effects, vec![Effect::StartListening]);
    assert!(state.view().listening);

    let (state, _) = update(
        state,
        Msg::TranscriptReceived("patient reports headache".to_string()),
    );
    let (state, _) = update(state, Msg::SpeechEnded);
    let view = state.view();
    assert_eq!(view.compose, "patient reports headache");
    assert!(!view.listening);
    assert!(view.messages.is_empty());
}

#[test]
fn delete_clicks_emit_store_effects_without_touching_state() {
    let state = AppState::new();
    let before = state.view();

    let (state, effects) = update(
        state,
        Msg::DeleteFormClicked {
            form_id: "f-1".to_string(),
        },
    );
    assert_eq!(state.view(), before);
    assert_eq!(
        effects,
        vec![Effect::DeleteForm {
            form_id: "f-1".to_string()
        }]
    );
}
