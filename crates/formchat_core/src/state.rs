use chrono::{DateTime, Utc};

use crate::view_model::{AppViewModel, DraftView, MessageRow};
use crate::{
    ConnectionState, FormDraft, FormRow, HandoffStatus, Message, MessageId, MessageStore, Notice,
    Selection, TemplateRow,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    messages: MessageStore,
    selection: Selection,
    connection: ConnectionState,
    compose: String,
    handoff: HandoffStatus,
    draft: Option<FormDraft>,
    templates: Vec<TemplateRow>,
    forms: Vec<FormRow>,
    notice: Option<Notice>,
    speech_supported: bool,
    listening: bool,
    write_through: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror the message log to the local cache after every append.
    pub fn with_write_through(mut self, enabled: bool) -> Self {
        self.write_through = enabled;
        self
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            connection: self.connection,
            messages: self
                .messages
                .all()
                .iter()
                .map(|message| MessageRow {
                    id: message.id().clone(),
                    text: message.text().to_string(),
                    is_user: message.is_user(),
                    timestamp: message.timestamp(),
                    selected: self.selection.contains(message.id()),
                })
                .collect(),
            selection: self.selection.ids().to_vec(),
            selection_mode: !self.selection.is_empty(),
            compose: self.compose.clone(),
            handoff_pending: matches!(self.handoff, HandoffStatus::Pending { .. }),
            draft: self.draft.as_ref().map(|draft| DraftView {
                template_code: draft.template_code().to_string(),
                form_id: draft.form_id().map(str::to_string),
                data: draft.data().clone(),
                saving: draft.is_saving(),
            }),
            templates: self.templates.clone(),
            forms: self.forms.clone(),
            notice: self.notice.clone(),
            speech_supported: self.speech_supported,
            listening: self.listening,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn draft(&self) -> Option<&FormDraft> {
        self.draft.as_ref()
    }

    pub fn messages_snapshot(&self) -> Vec<Message> {
        self.messages.all().to_vec()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn write_through(&self) -> bool {
        self.write_through
    }

    pub(crate) fn compose(&self) -> &str {
        &self.compose
    }

    pub(crate) fn set_compose(&mut self, text: String) {
        if self.compose != text {
            self.compose = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn append_message(&mut self, text: String, is_user: bool, at: DateTime<Utc>) -> MessageId {
        let id = self.messages.append(text, is_user, at);
        self.mark_dirty();
        id
    }

    pub(crate) fn restore_messages(&mut self, messages: Vec<Message>) -> usize {
        let mut restored = 0;
        for message in messages {
            if self.messages.restore(message) {
                restored += 1;
            }
        }
        if restored > 0 {
            self.mark_dirty();
        }
        restored
    }

    /// Clears the in-memory log. The selection goes with it so no id dangles.
    pub(crate) fn reset_messages(&mut self) {
        self.messages.clear();
        self.selection.retain_existing(&self.messages);
        self.compose.clear();
        self.mark_dirty();
    }

    pub(crate) fn long_press(&mut self, id: &MessageId) {
        if self.selection.long_press(id, &self.messages) {
            self.mark_dirty();
        }
    }

    pub(crate) fn tap(&mut self, id: &MessageId) {
        if self.selection.tap(id, &self.messages) {
            self.mark_dirty();
        }
    }

    pub(crate) fn cancel_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.cancel();
            self.mark_dirty();
        }
    }

    pub(crate) fn set_connection(&mut self, connection: ConnectionState) {
        if self.connection != connection {
            self.connection = connection;
            self.mark_dirty();
        }
    }

    pub(crate) fn handoff(&self) -> &HandoffStatus {
        &self.handoff
    }

    pub(crate) fn set_handoff(&mut self, handoff: HandoffStatus) {
        self.handoff = handoff;
        self.mark_dirty();
    }

    pub(crate) fn open_draft(&mut self, draft: FormDraft) {
        self.draft = Some(draft);
        self.mark_dirty();
    }

    pub(crate) fn draft_mut(&mut self) -> Option<&mut FormDraft> {
        if self.draft.is_some() {
            self.mark_dirty();
        }
        self.draft.as_mut()
    }

    pub(crate) fn close_draft(&mut self) {
        if self.draft.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn required_fields_for(&self, template_code: &str) -> Vec<String> {
        self.templates
            .iter()
            .find(|row| row.matches(template_code))
            .map(|row| row.required_fields.clone())
            .unwrap_or_default()
    }

    pub(crate) fn find_form(&self, form_id: &str) -> Option<&FormRow> {
        self.forms.iter().find(|row| row.form_id == form_id)
    }

    pub(crate) fn set_templates(&mut self, templates: Vec<TemplateRow>) {
        self.templates = templates;
        self.mark_dirty();
    }

    pub(crate) fn set_forms(&mut self, forms: Vec<FormRow>) {
        self.forms = forms;
        self.mark_dirty();
    }

    pub(crate) fn raise(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    pub(crate) fn dismiss_notice(&mut self) {
        if self.notice.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn speech_supported(&self) -> bool {
        self.speech_supported
    }

    pub(crate) fn set_speech_supported(&mut self, supported: bool) {
        self.speech_supported = supported;
        self.mark_dirty();
    }

    pub(crate) fn listening(&self) -> bool {
        self.listening
    }

    pub(crate) fn set_listening(&mut self, listening: bool) {
        if self.listening != listening {
            self.listening = listening;
            self.mark_dirty();
        }
    }
}
