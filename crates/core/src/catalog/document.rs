use serde_json::Value;

use super::CatalogError;

/// A parsed catalog document, classified once by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogDocument {
    /// A bare array; served as-is.
    List(Vec<Value>),
    /// `{"results": [...]}`; already enriched, served as-is.
    Results(Vec<Value>),
    /// `{"items": [...]}`; raw entries that need enrichment.
    Items(Vec<Value>),
    /// `{"shows": [...]}`; profile cache documents, served as-is.
    Shows(Vec<Value>),
}

impl CatalogDocument {
    /// Classify a JSON document. Object keys are checked in the order
    /// `results`, `items`, `shows`.
    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        match value {
            Value::Array(entries) => Ok(CatalogDocument::List(entries)),
            Value::Object(mut map) => {
                if let Some(results) = map.remove("results") {
                    return array_field("results", results).map(CatalogDocument::Results);
                }
                if let Some(items) = map.remove("items") {
                    return array_field("items", items).map(CatalogDocument::Items);
                }
                if let Some(shows) = map.remove("shows") {
                    return array_field("shows", shows).map(CatalogDocument::Shows);
                }
                Err(CatalogError::Format(
                    "document has neither `results` nor `items`".to_string(),
                ))
            }
            other => Err(CatalogError::Format(format!(
                "expected an array or object, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn entries(&self) -> &[Value] {
        match self {
            CatalogDocument::List(entries)
            | CatalogDocument::Results(entries)
            | CatalogDocument::Items(entries)
            | CatalogDocument::Shows(entries) => entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

fn array_field(field: &str, value: Value) -> Result<Vec<Value>, CatalogError> {
    match value {
        Value::Array(entries) => Ok(entries),
        _ => Err(CatalogError::Format(format!("`{}` is not an array", field))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
