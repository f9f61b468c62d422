use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{ConnectionState, FieldSpec, FormRow, Message, MessageId, Notice, TemplateRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Chat screen gained focus.
    ScreenOpened,
    /// Chat screen is being torn down; in-memory messages are dropped.
    ScreenClosed,
    /// Restore messages from the local write-through cache.
    RestoreMessages(Vec<Message>),
    /// User edited the compose box.
    ComposeChanged(String),
    /// User pressed send.
    SendClicked { at: DateTime<Utc> },
    /// A remote-authored message arrived on the stream.
    RemoteMessageReceived { text: String, at: DateTime<Utc> },
    /// Connection manager changed state.
    ConnectionChanged(ConnectionState),
    /// Connection attempt or live stream failed.
    ConnectionFailed { reason: String },
    MessageLongPressed(MessageId),
    MessageTapped(MessageId),
    SelectionCancelled,
    /// User chose a template for the selected messages.
    HandoffRequested { template_code: String },
    /// Extraction endpoint answered.
    ExtractionCompleted {
        template_code: String,
        result: Result<Map<String, Value>, Notice>,
    },
    /// Open an empty draft for a template.
    NewDraftRequested { template_code: String },
    /// Reopen a saved form in the editor.
    EditFormRequested { form_id: String },
    DraftFieldEdited { path: String, value: String },
    DraftSaveClicked { at: DateTime<Utc> },
    DraftDiscarded,
    FormSaved(Result<(), Notice>),
    RefreshClicked,
    TemplatesLoaded(Vec<TemplateRow>),
    FormsLoaded(Vec<FormRow>),
    /// A template or form store call failed.
    StoreFailed(Notice),
    TemplateSubmitted { name: String, fields: Vec<FieldSpec> },
    TemplateRenamed { template_id: String, name: String },
    DeleteTemplateClicked { template_id: String },
    DeleteFormClicked { form_id: String },
    /// Result of the one-time speech capability check.
    SpeechCapabilityDetected(bool),
    ListenToggled,
    /// Final recognition result; replaces the compose text.
    TranscriptReceived(String),
    SpeechEnded,
    SpeechFailed(Notice),
    NoticeDismissed,
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
