//! Formchat core: pure chat/session state machine and view-model helpers.
mod catalog;
mod connection;
mod draft;
mod effect;
mod handoff;
mod message;
mod msg;
mod notice;
mod selection;
mod state;
mod update;
mod view_model;

pub use catalog::{check_template, FieldSpec, FormRow, TemplateError, TemplateRow};
pub use connection::ConnectionState;
pub use draft::{FormDraft, ValidationError, UNSECTIONED};
pub use effect::Effect;
pub use handoff::{
    concatenate_selection, submit_selection, EmptySelectionError, HandoffRequest, HandoffStatus,
};
pub use message::{Message, MessageId, MessageStore};
pub use msg::Msg;
pub use notice::{Notice, NoticeKind};
pub use selection::Selection;
pub use state::AppState;
pub use update::update;
pub use view_model::{AppViewModel, DraftView, MessageRow};
