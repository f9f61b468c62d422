use std::collections::BTreeMap;

use async_trait::async_trait;
use engine_logging::{engine_debug, engine_info};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::records::FlatField;
use crate::rest::RestClient;
use crate::FetchError;

/// Extracted values at or below this confidence are dropped.
pub const CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Section used for field ids without a dotted prefix.
pub const UNSECTIONED: &str = "general";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub template_code: String,
    pub conversation_text: String,
    pub template_fields: Vec<FlatField>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldExtraction>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldExtraction {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub source_quote: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl FieldExtraction {
    fn is_confident(&self) -> bool {
        self.value.is_some() && self.confidence.is_some_and(|c| c > CONFIDENCE_THRESHOLD)
    }
}

/// Turns `{"section.field": {...}}` into nested form data, keeping confident values only.
pub fn nest_confident_fields(response: ExtractionResponse) -> Map<String, Value> {
    let mut data = Map::new();
    for (path, extraction) in response.fields {
        if !extraction.is_confident() {
            engine_debug!("dropping low-confidence field {}", path);
            continue;
        }
        if let Some(value) = extraction.value {
            insert_path(&mut data, &path, value);
        }
    }
    data
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some(leaf) = segments.pop() else {
        return;
    };
    if segments.is_empty() {
        segments.push(UNSECTIONED);
    }

    let mut current = target;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(leaf.to_string(), value);
}

/// Turns conversation text into pre-filled form data for a template.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Map<String, Value>, FetchError>;
}

#[async_trait]
impl Extractor for RestClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Map<String, Value>, FetchError> {
        let segments: Vec<&str> = self.settings().extract_path.split('/').collect();
        let url = self.endpoint(&segments)?;
        let http = self.request(Method::POST, url).await?.json(request);
        let response: ExtractionResponse = self.send_json(http).await?;
        let data = nest_confident_fields(response);
        engine_info!(
            "extracted {} section(s) for template {}",
            data.len(),
            request.template_code
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> ExtractionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn keeps_confident_values_nested_by_section() {
        let data = nest_confident_fields(response(json!({
            "fields": {
                "vitals.bp": { "value": "120/80", "source_quote": "BP 120/80", "confidence": 0.95 },
                "vitals.pulse": { "value": 72, "confidence": 0.8 },
                "vitals.temp": { "value": null, "confidence": 0.99 },
                "notes": { "value": "follow up", "confidence": 0.9 }
            }
        })));

        assert_eq!(
            Value::Object(data),
            json!({
                "vitals": { "bp": "120/80" },
                "general": { "notes": "follow up" }
            })
        );
    }

    #[test]
    fn missing_fields_yield_empty_data() {
        assert!(nest_confident_fields(response(json!({}))).is_empty());
    }
}
