//! Control-plane object records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single object returned by the control plane (tenant, virtual service,
/// service engine, ...)
///
/// Records are kept as raw JSON objects; the runner only ever reads a few
/// well-known keys plus whatever field a test case names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRecord(Map<String, Value>);

impl ObjectRecord {
    /// Wrap a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Convert an arbitrary JSON value, returning `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The object's `name`, if present and a string
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// The object's `uuid`, if present and a string
    pub fn uuid(&self) -> Option<&str> {
        self.0.get("uuid").and_then(Value::as_str)
    }

    /// True when the record carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read an arbitrary field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Mutable access for gateways that apply partial updates
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }
}

impl From<Map<String, Value>> for ObjectRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Names of the first `limit` records, `N/A` where a record has none
pub fn sample_names(records: &[ObjectRecord], limit: usize) -> Vec<String> {
    records
        .iter()
        .take(limit)
        .map(|r| r.name().unwrap_or("N/A").to_string())
        .collect()
}
