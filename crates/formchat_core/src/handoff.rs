use thiserror::Error;

use crate::{Message, MessageStore, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("select at least one message before choosing a template")]
pub struct EmptySelectionError;

/// Selected conversation text bound for the extraction endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRequest {
    pub template_code: String,
    pub text: String,
}

/// Joins the text of the selected messages, in selection order, with single spaces.
pub fn concatenate_selection(
    selection: &Selection,
    store: &MessageStore,
) -> Result<String, EmptySelectionError> {
    let text = selection
        .ids()
        .iter()
        .filter_map(|id| store.get(id))
        .map(Message::text)
        .collect::<Vec<_>>()
        .join(" ");
    if text.trim().is_empty() {
        return Err(EmptySelectionError);
    }
    Ok(text)
}

pub fn submit_selection(
    selection: &Selection,
    store: &MessageStore,
    template_code: &str,
) -> Result<HandoffRequest, EmptySelectionError> {
    let text = concatenate_selection(selection, store)?;
    Ok(HandoffRequest {
        template_code: template_code.to_string(),
        text,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HandoffStatus {
    #[default]
    Idle,
    /// Extraction requested; further submits are ignored until it resolves.
    Pending { template_code: String },
}
