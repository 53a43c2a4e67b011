//! OpenAPI document model - paths, operations, parameters, schemas
//!
//! Only the subset consumed by request synthesis is modelled. Unknown keys are
//! ignored, so real-world documents load without a full OpenAPI validator.
//! Maps keep document order: catalog order (and therefore case titles) must be
//! reproducible across runs.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed OpenAPI document. Immutable once loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
}

/// One entry of `paths`: the operations declared for a path template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,
    #[serde(default)]
    pub post: Option<Operation>,
    #[serde(default)]
    pub put: Option<Operation>,
    #[serde(default)]
    pub patch: Option<Operation>,
    #[serde(default)]
    pub delete: Option<Operation>,
    /// Path-level parameters shared by every operation on this path
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    #[must_use]
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub request_body: Option<RequestBody>,
    /// Status code (or `default`) → response object. Only the keys are used.
    #[serde(default)]
    pub responses: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    /// Media type → media type object
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "in", default)]
    pub location: ParamLocation,
    #[serde(default)]
    pub required: bool,
    /// `example: null` deserializes to `None` and counts as no example.
    #[serde(default)]
    pub example: Option<Value>,
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Where a parameter is carried.
///
/// `$ref` parameters and unknown locations land in `Other` and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    #[default]
    #[serde(other)]
    Other,
}

/// A JSON-Schema-like node.
///
/// `$ref` wins over every other field. Otherwise `type` decides the variant;
/// a node without a recognised `type` that declares `properties` is an object.
/// Malformed keywords degrade to defaults instead of rejecting the document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum Schema {
    Ref(String),
    String {
        format: Option<StringFormat>,
        example: Option<Value>,
    },
    /// `integer` or `number`
    Number { example: Option<Value> },
    Boolean { example: Option<Value> },
    Array {
        items: Option<Box<Schema>>,
        example: Option<Value>,
    },
    Object {
        properties: IndexMap<String, Schema>,
        required: Vec<String>,
        example: Option<Value>,
    },
    Unknown { example: Option<Value> },
}

impl Schema {
    /// Author-supplied example, if any. A `$ref` node never has one.
    #[must_use]
    pub fn example(&self) -> Option<&Value> {
        match self {
            Self::Ref(_) => None,
            Self::String { example, .. }
            | Self::Number { example }
            | Self::Boolean { example }
            | Self::Array { example, .. }
            | Self::Object { example, .. }
            | Self::Unknown { example } => example.as_ref(),
        }
    }

    /// Declared type name, as used for query parameter defaults.
    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::String { .. } => Some("string"),
            Self::Number { .. } => Some("number"),
            Self::Boolean { .. } => Some("boolean"),
            Self::Array { .. } => Some("array"),
            Self::Object { .. } => Some("object"),
            Self::Ref(_) | Self::Unknown { .. } => None,
        }
    }
}

/// String formats with dedicated synthesis. Anything else is `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringFormat {
    Email,
    Date,
    Password,
    Other(String),
}

impl From<String> for StringFormat {
    fn from(format: String) -> Self {
        match format.as_str() {
            "email" => Self::Email,
            "date" => Self::Date,
            "password" => Self::Password,
            _ => Self::Other(format),
        }
    }
}

impl From<Value> for Schema {
    fn from(value: Value) -> Self {
        // Boolean schemas (`true`/`false`) and other non-object nodes carry no shape
        let Value::Object(mut node) = value else {
            return Self::Unknown { example: None };
        };
        if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
            return Self::Ref(reference.to_string());
        }

        let example = node.remove("example").filter(|v| !v.is_null());
        let required = match node.get("required") {
            Some(Value::Array(keys)) => keys
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        let properties = match node.remove("properties") {
            Some(Value::Object(props)) => Some(
                props
                    .into_iter()
                    .map(|(name, schema)| (name, Self::from(schema)))
                    .collect::<IndexMap<_, _>>(),
            ),
            _ => None,
        };

        let items = node.remove("items");
        let kind = node.get("type").and_then(Value::as_str).map(str::to_string);

        // OpenAPI 3.1 type arrays are not a recognised type
        match kind.as_deref() {
            Some("string") => Self::String {
                format: node
                    .get("format")
                    .and_then(Value::as_str)
                    .map(|f| StringFormat::from(f.to_string())),
                example,
            },
            Some("integer" | "number") => Self::Number { example },
            Some("boolean") => Self::Boolean { example },
            Some("array") => Self::Array {
                items: items.map(|items| Box::new(Self::from(items))),
                example,
            },
            Some("object") => Self::Object {
                properties: properties.unwrap_or_default(),
                required,
                example,
            },
            _ => match properties {
                Some(properties) => Self::Object {
                    properties,
                    required,
                    example,
                },
                None => Self::Unknown { example },
            },
        }
    }
}

/// HTTP methods the catalog enumerates, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Fixed enumeration order: `[get, post, put, patch, delete]`.
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Lowercase name, as used in operation keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }

    /// Uppercase wire name.
    #[must_use]
    pub const fn as_upper(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Methods that may mutate server state.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Put | Self::Patch | Self::Delete)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_upper())
    }
}

impl FromStr for HttpMethod {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DocumentError::UnsupportedMethod(s.to_string()))
    }
}

impl OpenApiDocument {
    /// Load a document from a local JSON or YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DocumentError::Io(path.to_path_buf(), e.to_string()))?;
        Self::parse(path, &content)
    }

    /// Parse JSON or YAML.
    ///
    /// Detection strategy: try extension first (`.json`/`.yaml`/`.yml`), then
    /// fall back to content sniffing (leading `{` → JSON, otherwise YAML).
    ///
    /// # Errors
    ///
    /// Returns error if the content is not a valid document.
    pub fn parse(path: &Path, content: &str) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(content),
            "json" => Self::from_json_str(content),
            _ if content.trim_start().starts_with('{') => Self::from_json_str(content),
            _ => Self::from_yaml_str(content),
        }
    }

    /// # Errors
    ///
    /// Returns error if `content` is not a valid JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(content).map_err(|e| DocumentError::Parse(format!("Invalid JSON: {e}")))
    }

    /// # Errors
    ///
    /// Returns error if `content` is not a valid YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        serde_yml::from_str(content).map_err(|e| DocumentError::Parse(format!("Invalid YAML: {e}")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),
}
