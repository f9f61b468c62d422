use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::CollectionKind;

/// A server-owned record cached by a [`crate::RecordStore`].
pub trait Record: Clone + Send + Sync + DeserializeOwned + 'static {
    /// Body of a create request.
    type Draft: Serialize + Send + Sync;
    /// Body of an update request.
    type Patch: Serialize + Send + Sync;

    const COLLECTION: CollectionKind;

    fn record_id(&self) -> &str;
}

/// Record timestamps arrive either as epoch seconds or as ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerTime {
    Epoch(i64),
    Text(String),
}

impl fmt::Display for ServerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerTime::Epoch(secs) => write!(f, "{secs}"),
            ServerTime::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    General,
    Pediatric,
    Dental,
    Emergency,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub template_id: String,
    #[serde(alias = "name", default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TemplateKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub fields: Vec<TemplateField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<ServerTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<ServerTime>,
}

impl Template {
    /// The code users pick templates by; falls back to the server id.
    pub fn code(&self) -> &str {
        self.template_code.as_deref().unwrap_or(&self.template_id)
    }

    pub fn matches(&self, code_or_id: &str) -> bool {
        self.code() == code_or_id || self.template_id == code_or_id
    }

    pub fn flat_fields(&self) -> Vec<FlatField> {
        let mut out = Vec::new();
        flatten_into(&self.fields, "", &mut out);
        out
    }

    pub fn required_paths(&self) -> Vec<String> {
        self.flat_fields()
            .into_iter()
            .filter(|field| field.required)
            .map(|field| field.id)
            .collect()
    }
}

impl Record for Template {
    type Draft = NewTemplate;
    type Patch = TemplatePatch;

    const COLLECTION: CollectionKind = CollectionKind::Templates;

    fn record_id(&self) -> &str {
        &self.template_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Children of `section` and `group` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TemplateField>,
    /// Columns of `table` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<TableColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// A leaf field addressed by its dotted path, as sent to the extraction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<TableColumn>,
}

fn flatten_into(fields: &[TemplateField], prefix: &str, out: &mut Vec<FlatField>) {
    for field in fields {
        let path = if prefix.is_empty() {
            field.id.clone()
        } else {
            format!("{prefix}.{}", field.id)
        };
        let is_container = matches!(field.field_type.as_str(), "section" | "group");
        if is_container && !field.fields.is_empty() {
            flatten_into(&field.fields, &path, out);
            continue;
        }
        out.push(FlatField {
            id: path,
            field_type: field.field_type.clone(),
            label: field.label.clone(),
            required: field.required,
            options: field.options.clone(),
            columns: field.columns.clone(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTemplate {
    pub name: String,
    pub fields: Vec<TemplateField>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<TemplateField>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledForm {
    pub form_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(alias = "templateId", default)]
    pub template_code: String,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<ServerTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<ServerTime>,
}

impl Record for FilledForm {
    type Draft = NewFilledForm;
    type Patch = FormPatch;

    const COLLECTION: CollectionKind = CollectionKind::Forms;

    fn record_id(&self) -> &str {
        &self.form_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFilledForm {
    pub template_code: String,
    pub data: Map<String, Value>,
    /// ISO-8601 creation time.
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormPatch {
    pub data: Map<String, Value>,
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
