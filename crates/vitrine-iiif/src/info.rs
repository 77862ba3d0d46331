//! Image-information document model.
//!
//! The document is kept as raw JSON: the viewer only interprets the `service`
//! blocks, everything else passes through to the tile renderer untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An image-information (`info.json`) document.
///
/// Unknown fields are preserved verbatim so the same value can be handed to a
/// tile source without re-fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityDocument(Value);

impl CapabilityDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The document's own `@id`, when present.
    pub fn id(&self) -> Option<&str> {
        self.0.get("@id").and_then(Value::as_str)
    }

    /// Top-level service entries, normalized to a sequence.
    pub fn services(&self) -> Vec<ServiceEntry> {
        normalize_service_field(self.0.get("service"))
    }
}

impl From<Value> for CapabilityDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// One `service` block from a capability document.
///
/// Every field is optional on the wire; consumers decide which entries are
/// usable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceEntry {
    #[serde(rename = "@id")]
    pub id: Option<String>,
    pub profile: Option<String>,
    pub label: Option<String>,
    service: Option<Value>,
}

impl ServiceEntry {
    pub fn has_profile(&self, profile: &str) -> bool {
        self.profile.as_deref() == Some(profile)
    }

    /// Nested service entries, normalized to a sequence.
    pub fn nested_services(&self) -> Vec<ServiceEntry> {
        normalize_service_field(self.service.as_ref())
    }
}

/// Normalizes a `service` field to a sequence of entries.
///
/// A single inline object is equivalent to a one-element array. Entries that
/// are not service-shaped objects are skipped rather than failing the whole
/// document.
fn normalize_service_field(field: Option<&Value>) -> Vec<ServiceEntry> {
    let Some(value) = field else {
        return Vec::new();
    };
    let candidates: Vec<&Value> = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    };
    candidates
        .into_iter()
        .filter_map(|candidate| serde_json::from_value(candidate.clone()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_service_field_yields_no_entries() {
        let doc = CapabilityDocument::new(json!({ "@id": "https://example.org/img" }));
        assert_eq!(doc.id(), Some("https://example.org/img"));
        assert!(doc.services().is_empty());
    }

    #[test]
    fn inline_object_equals_one_element_array() {
        let entry = json!({ "@id": "https://auth.example.org/login", "profile": "p" });
        let inline = CapabilityDocument::new(json!({ "service": entry.clone() }));
        let array = CapabilityDocument::new(json!({ "service": [entry] }));
        assert_eq!(inline.services(), array.services());
        assert_eq!(inline.services().len(), 1);
    }

    #[test]
    fn non_service_entries_are_skipped() {
        let doc = CapabilityDocument::new(json!({
            "service": [42, "bogus", { "@id": "https://auth.example.org/login" }, null]
        }));
        let entries = doc.services();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some("https://auth.example.org/login"));
    }

    #[test]
    fn scalar_service_field_yields_no_entries() {
        let doc = CapabilityDocument::new(json!({ "service": "not a service" }));
        assert!(doc.services().is_empty());
    }

    #[test]
    fn nested_services_normalize_recursively() {
        let doc = CapabilityDocument::new(json!({
            "service": {
                "@id": "https://auth.example.org/login",
                "service": { "@id": "https://auth.example.org/token" }
            }
        }));
        let outer = doc.services();
        let inner = outer[0].nested_services();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].id.as_deref(), Some("https://auth.example.org/token"));
    }
}
