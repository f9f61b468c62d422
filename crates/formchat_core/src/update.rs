use serde_json::Value;

use crate::{
    check_template, submit_selection, AppState, ConnectionState, Effect, FormDraft, HandoffStatus,
    Msg, Notice, NoticeKind,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ScreenOpened => {
            let mut effects = Vec::with_capacity(3);
            if state.connection().needs_connect() {
                effects.push(Effect::Connect);
            }
            effects.push(Effect::LoadTemplates);
            effects.push(Effect::LoadForms);
            effects
        }
        Msg::ScreenClosed => {
            state.reset_messages();
            state.set_handoff(HandoffStatus::Idle);
            let mut effects = vec![Effect::Disconnect];
            if state.listening() {
                state.set_listening(false);
                effects.push(Effect::StopListening);
            }
            effects
        }
        Msg::RestoreMessages(messages) => {
            state.restore_messages(messages);
            Vec::new()
        }
        Msg::ComposeChanged(text) => {
            state.set_compose(text);
            Vec::new()
        }
        Msg::SendClicked { at } => {
            let text = state.compose().trim().to_string();
            if text.is_empty() {
                return (state, Vec::new());
            }
            state.append_message(text.clone(), true, at);
            state.set_compose(String::new());

            let mut effects = Vec::with_capacity(3);
            // Reconnect on the next interaction; the engine runs these in order.
            if state.connection().needs_connect() {
                effects.push(Effect::Connect);
            }
            effects.push(Effect::SendMessage { text });
            push_mirror(&state, &mut effects);
            effects
        }
        Msg::RemoteMessageReceived { text, at } => {
            state.append_message(text, false, at);
            let mut effects = Vec::new();
            push_mirror(&state, &mut effects);
            effects
        }
        Msg::ConnectionChanged(connection) => {
            state.set_connection(connection);
            Vec::new()
        }
        Msg::ConnectionFailed { reason } => {
            state.set_connection(ConnectionState::Closed);
            state.raise(Notice::network(format!("Connection lost: {reason}")));
            Vec::new()
        }
        Msg::MessageLongPressed(id) => {
            state.long_press(&id);
            Vec::new()
        }
        Msg::MessageTapped(id) => {
            state.tap(&id);
            Vec::new()
        }
        Msg::SelectionCancelled => {
            state.cancel_selection();
            Vec::new()
        }
        Msg::HandoffRequested { template_code } => {
            if matches!(state.handoff(), HandoffStatus::Pending { .. }) {
                return (state, Vec::new());
            }
            if template_code.trim().is_empty() {
                state.raise(Notice::validation("Choose a template first."));
                return (state, Vec::new());
            }
            match submit_selection(state.selection(), state.messages(), &template_code) {
                Ok(request) => {
                    state.set_handoff(HandoffStatus::Pending {
                        template_code: request.template_code.clone(),
                    });
                    vec![Effect::RequestExtraction {
                        template_code: request.template_code,
                        text: request.text,
                    }]
                }
                Err(err) => {
                    state.raise(Notice::new(NoticeKind::EmptySelection, err.to_string()));
                    Vec::new()
                }
            }
        }
        Msg::ExtractionCompleted {
            template_code,
            result,
        } => {
            // Late responses still apply; in-flight requests are never cancelled.
            state.set_handoff(HandoffStatus::Idle);
            match result {
                Ok(data) => {
                    state.cancel_selection();
                    let required = state.required_fields_for(&template_code);
                    state.open_draft(FormDraft::prefilled(template_code.clone(), data, required));
                    vec![Effect::OpenFormEditor { template_code }]
                }
                Err(notice) => {
                    state.raise(notice);
                    Vec::new()
                }
            }
        }
        Msg::NewDraftRequested { template_code } => {
            if template_code.trim().is_empty() {
                state.raise(Notice::validation("Choose a template first."));
                return (state, Vec::new());
            }
            let required = state.required_fields_for(&template_code);
            state.open_draft(FormDraft::new(template_code.clone(), required));
            vec![Effect::OpenFormEditor { template_code }]
        }
        Msg::EditFormRequested { form_id } => {
            let Some(form) = state.find_form(&form_id) else {
                state.raise(Notice::validation(format!("No saved form {form_id}.")));
                return (state, Vec::new());
            };
            let template_code = form.template_code.clone();
            let data = form.data.clone();
            let required = state.required_fields_for(&template_code);
            state.open_draft(FormDraft::editing(form_id, template_code.clone(), data, required));
            vec![Effect::OpenFormEditor { template_code }]
        }
        Msg::DraftFieldEdited { path, value } => {
            if let Some(draft) = state.draft_mut() {
                draft.set_field(&path, Value::String(value));
            }
            Vec::new()
        }
        Msg::DraftSaveClicked { at } => {
            let Some(draft) = state.draft() else {
                return (state, Vec::new());
            };
            if draft.is_saving() {
                return (state, Vec::new());
            }
            match draft.validate() {
                Ok(()) => {
                    let effect = match draft.form_id() {
                        Some(form_id) => Effect::UpdateForm {
                            form_id: form_id.to_string(),
                            data: draft.data().clone(),
                        },
                        None => Effect::SaveForm {
                            template_code: draft.template_code().to_string(),
                            data: draft.data().clone(),
                            created_at: at,
                        },
                    };
                    if let Some(draft) = state.draft_mut() {
                        draft.set_saving(true);
                    }
                    vec![effect]
                }
                Err(err) => {
                    state.raise(Notice::validation(err.to_string()));
                    Vec::new()
                }
            }
        }
        Msg::DraftDiscarded => {
            state.close_draft();
            Vec::new()
        }
        Msg::FormSaved(result) => {
            match result {
                Ok(()) => state.close_draft(),
                Err(notice) => {
                    if let Some(draft) = state.draft_mut() {
                        draft.set_saving(false);
                    }
                    state.raise(notice);
                }
            }
            Vec::new()
        }
        Msg::RefreshClicked => vec![Effect::LoadTemplates, Effect::LoadForms],
        Msg::TemplatesLoaded(templates) => {
            state.set_templates(templates);
            Vec::new()
        }
        Msg::FormsLoaded(forms) => {
            state.set_forms(forms);
            Vec::new()
        }
        Msg::StoreFailed(notice) => {
            state.raise(notice);
            Vec::new()
        }
        Msg::TemplateSubmitted { name, fields } => match check_template(&name, &fields) {
            Ok(()) => vec![Effect::CreateTemplate {
                name: name.trim().to_string(),
                fields,
            }],
            Err(err) => {
                state.raise(Notice::validation(err.to_string()));
                Vec::new()
            }
        },
        Msg::TemplateRenamed { template_id, name } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                state.raise(Notice::validation("A template needs a name."));
                return (state, Vec::new());
            }
            vec![Effect::RenameTemplate { template_id, name }]
        }
        Msg::DeleteTemplateClicked { template_id } => {
            vec![Effect::DeleteTemplate { template_id }]
        }
        Msg::DeleteFormClicked { form_id } => vec![Effect::DeleteForm { form_id }],
        Msg::SpeechCapabilityDetected(supported) => {
            state.set_speech_supported(supported);
            Vec::new()
        }
        Msg::ListenToggled => {
            if !state.speech_supported() {
                state.raise(Notice::speech("Voice input is not available on this device."));
                Vec::new()
            } else if state.listening() {
                state.set_listening(false);
                vec![Effect::StopListening]
            } else {
                state.set_listening(true);
                vec![Effect::StartListening]
            }
        }
        Msg::TranscriptReceived(text) => {
            state.set_compose(text);
            Vec::new()
        }
        Msg::SpeechEnded => {
            state.set_listening(false);
            Vec::new()
        }
        Msg::SpeechFailed(notice) => {
            state.set_listening(false);
            state.raise(notice);
            Vec::new()
        }
        Msg::NoticeDismissed => {
            state.dismiss_notice();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn push_mirror(state: &AppState, effects: &mut Vec<Effect>) {
    if state.write_through() {
        effects.push(Effect::MirrorMessages(state.messages_snapshot()));
    }
}
