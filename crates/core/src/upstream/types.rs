//! The opaque upstream document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One upstream metadata document, stored and replaced as a whole.
///
/// Only a handful of fields are read during projection; everything else is
/// kept verbatim so the snapshot round-trips the full response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpstreamRecord(Map<String, Value>);

impl UpstreamRecord {
    /// Wrap a JSON value; only objects are valid records.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// String field, if present and a string.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn f64_field(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn u64_field(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(Value::as_u64)
    }
}

impl From<Map<String, Value>> for UpstreamRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
