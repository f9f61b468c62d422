use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("choose a template before saving")]
    MissingTemplate,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// Section holding fields whose path has no dotted prefix.
pub const UNSECTIONED: &str = "general";

/// A form being edited before it is persisted.
///
/// `data` is nested by dotted field path (`vitals.bp` lives at
/// `data["vitals"]["bp"]`), matching what the extraction endpoint returns.
/// A bare path such as `notes` lives at `data["general"]["notes"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    template_code: String,
    /// Set when editing a form that was already saved.
    form_id: Option<String>,
    data: Map<String, Value>,
    required: Vec<String>,
    saving: bool,
}

impl FormDraft {
    pub fn new(template_code: impl Into<String>, required: Vec<String>) -> Self {
        Self::prefilled(template_code, Map::new(), required)
    }

    pub fn prefilled(
        template_code: impl Into<String>,
        data: Map<String, Value>,
        required: Vec<String>,
    ) -> Self {
        Self {
            template_code: template_code.into(),
            form_id: None,
            data,
            required,
            saving: false,
        }
    }

    /// Reopens a saved form; saving it updates the existing record.
    pub fn editing(
        form_id: impl Into<String>,
        template_code: impl Into<String>,
        data: Map<String, Value>,
        required: Vec<String>,
    ) -> Self {
        Self {
            form_id: Some(form_id.into()),
            ..Self::prefilled(template_code, data, required)
        }
    }

    pub fn template_code(&self) -> &str {
        &self.template_code
    }

    pub fn form_id(&self) -> Option<&str> {
        self.form_id.as_deref()
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub(crate) fn set_saving(&mut self, saving: bool) {
        self.saving = saving;
    }

    pub fn field(&self, path: &str) -> Option<&Value> {
        let segments = data_path(path);
        let (first, rest) = segments.split_first()?;
        let mut current = self.data.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    pub fn set_field(&mut self, path: &str, value: Value) {
        let segments = data_path(path);
        let Some((last, parents)) = segments.split_last() else {
            return;
        };
        let mut object = &mut self.data;
        for segment in parents {
            let slot = object
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            object = match slot {
                Value::Object(map) => map,
                _ => return,
            };
        }
        object.insert(last.to_string(), value);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.template_code.trim().is_empty() {
            return Err(ValidationError::MissingTemplate);
        }
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|path| self.field(path).map_or(true, is_blank))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }
}

/// Splits a field path into data keys, placing bare names under [`UNSECTIONED`].
fn data_path(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if segments.len() == 1 {
        segments.insert(0, UNSECTIONED);
    }
    segments
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
