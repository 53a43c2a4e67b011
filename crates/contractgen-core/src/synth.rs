//! Schema → plausible `serde_json::Value` synthesizer
//!
//! Deterministic, minimal values meant to pass basic request validation:
//! an author example always wins, then a fixed literal per type/format.
//! Object bodies carry only the required properties when any are declared,
//! otherwise every declared property.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value, json};

use crate::document::{OpenApiDocument, Schema, StringFormat};

/// Maximum recursion depth (guards cyclic component schemas).
const MAX_DEPTH: u32 = 20;

/// Value for a missing schema.
pub const MISSING_SCHEMA_VALUE: &str = "sample";
/// Value for plain strings and unrecognised types.
pub const FALLBACK_TEXT: &str = "sample-text";
pub const DATE_VALUE: &str = "1990-01-01";
pub const PASSWORD_VALUE: &str = "Aa@123456";

/// Synthesizes values from schemas of one document.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'a> {
    doc: &'a OpenApiDocument,
}

impl<'a> Synthesizer<'a> {
    #[must_use]
    pub const fn new(doc: &'a OpenApiDocument) -> Self {
        Self { doc }
    }

    /// Synthesize any value (primitive, array or object).
    #[must_use]
    pub fn value(&self, schema: Option<&Schema>) -> Value {
        self.value_inner(schema, 0)
    }

    /// Synthesize an object body. Non-object schemas yield `{}`.
    #[must_use]
    pub fn object(&self, schema: Option<&Schema>) -> Map<String, Value> {
        self.object_inner(schema, 0)
    }

    fn value_inner(&self, schema: Option<&Schema>, depth: u32) -> Value {
        let Some(resolved) = self.doc.resolve(schema) else {
            return json!(MISSING_SCHEMA_VALUE);
        };
        if let Some(example) = resolved.example() {
            return example.clone();
        }
        if depth > MAX_DEPTH {
            return json!(FALLBACK_TEXT);
        }

        match resolved {
            Schema::String { format, .. } => match format {
                Some(StringFormat::Email) => Value::String(unique_email()),
                Some(StringFormat::Date) => json!(DATE_VALUE),
                Some(StringFormat::Password) => json!(PASSWORD_VALUE),
                Some(StringFormat::Other(_)) | None => json!(FALLBACK_TEXT),
            },
            Schema::Number { .. } => json!(1),
            Schema::Boolean { .. } => Value::Bool(true),
            Schema::Array { items, .. } => {
                Value::Array(vec![self.value_inner(items.as_deref(), depth + 1)])
            }
            Schema::Object { .. } => Value::Object(self.object_inner(Some(resolved), depth + 1)),
            // Unresolved refs are opaque
            Schema::Ref(_) | Schema::Unknown { .. } => json!(FALLBACK_TEXT),
        }
    }

    fn object_inner(&self, schema: Option<&Schema>, depth: u32) -> Map<String, Value> {
        let Some(Schema::Object {
            properties,
            required,
            ..
        }) = self.doc.resolve(schema)
        else {
            return Map::new();
        };
        if depth > MAX_DEPTH {
            return Map::new();
        }

        let required: Vec<&String> = required
            .iter()
            .filter(|name| properties.contains_key(name.as_str()))
            .collect();
        let keys = if required.is_empty() {
            properties.keys().collect()
        } else {
            required
        };

        keys.into_iter()
            .map(|key| (key.clone(), self.value_inner(properties.get(key), depth + 1)))
            .collect()
    }
}

/// `api.<millis>@example.test`; the timestamp dodges "already exists" conflicts
/// across repeated runs.
fn unique_email() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("api.{millis}@example.test")
}
