use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

/// Template summary mirrored from the template store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRow {
    pub template_id: String,
    pub code: String,
    pub title: String,
    /// Dotted paths of fields that must be filled before a form can be saved.
    pub required_fields: Vec<String>,
}

impl TemplateRow {
    pub fn matches(&self, code_or_id: &str) -> bool {
        self.code == code_or_id || self.template_id == code_or_id
    }
}

/// Filled form summary mirrored from the form store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRow {
    pub form_id: String,
    pub template_code: String,
    pub created_at: Option<String>,
    pub field_count: usize,
    /// Saved data, used to reopen the form for editing.
    pub data: Map<String, Value>,
}

/// One field of a template being built. A dotted `id` (`vitals.bp`) places
/// the field inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: String,
    pub field_type: String,
    pub label: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("a template needs a name")]
    MissingName,
    #[error("a template needs at least one field")]
    NoFields,
    #[error("field {0:?} has an empty id")]
    EmptyFieldId(String),
    #[error("field id {0} is used twice")]
    DuplicateField(String),
}

/// Checks a template before it is sent to the store.
pub fn check_template(name: &str, fields: &[FieldSpec]) -> Result<(), TemplateError> {
    if name.trim().is_empty() {
        return Err(TemplateError::MissingName);
    }
    if fields.is_empty() {
        return Err(TemplateError::NoFields);
    }
    let mut seen = HashSet::new();
    for field in fields {
        if field.id.split('.').any(|segment| segment.trim().is_empty()) {
            return Err(TemplateError::EmptyFieldId(field.id.clone()));
        }
        if !seen.insert(field.id.as_str()) {
            return Err(TemplateError::DuplicateField(field.id.clone()));
        }
    }
    Ok(())
}
