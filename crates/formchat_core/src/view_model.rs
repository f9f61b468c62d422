use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{ConnectionState, FormRow, MessageId, Notice, TemplateRow};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub connection: ConnectionState,
    pub messages: Vec<MessageRow>,
    /// Selected ids in selection order.
    pub selection: Vec<MessageId>,
    pub selection_mode: bool,
    pub compose: String,
    pub handoff_pending: bool,
    pub draft: Option<DraftView>,
    pub templates: Vec<TemplateRow>,
    pub forms: Vec<FormRow>,
    pub notice: Option<Notice>,
    pub speech_supported: bool,
    pub listening: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: MessageId,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftView {
    pub template_code: String,
    /// Present when editing a saved form.
    pub form_id: Option<String>,
    pub data: Map<String, Value>,
    pub saving: bool,
}
