use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{FieldSpec, Message};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Connect,
    SendMessage { text: String },
    Disconnect,
    RequestExtraction { template_code: String, text: String },
    /// Navigate to the form editor; the draft lives in state.
    OpenFormEditor { template_code: String },
    SaveForm {
        template_code: String,
        data: Map<String, Value>,
        created_at: DateTime<Utc>,
    },
    /// Update an already saved form in place.
    UpdateForm {
        form_id: String,
        data: Map<String, Value>,
    },
    CreateTemplate { name: String, fields: Vec<FieldSpec> },
    RenameTemplate { template_id: String, name: String },
    LoadTemplates,
    LoadForms,
    DeleteTemplate { template_id: String },
    DeleteForm { form_id: String },
    StartListening,
    StopListening,
    /// Write-through snapshot of the message log.
    MirrorMessages(Vec<Message>),
}
