//! OpenAPI specification structs for serde deserialization.
//!
//! This module defines the subset of OpenAPI 3.x needed to classify schemas and
//! describe endpoints. Maps whose order matters (properties, components) use
//! `IndexMap` so declaration order survives parsing.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::GenError;

/// Root OpenAPI specification.
#[derive(Debug, Deserialize)]
pub struct OpenApiSpec {
    /// Document version string, e.g. `3.0.3`.
    #[serde(default)]
    pub openapi: String,
    /// API metadata.
    #[serde(default)]
    pub info: Info,
    /// All endpoints keyed by path template.
    pub paths: IndexMap<String, PathItem>,
    /// Reusable definitions.
    #[serde(default)]
    pub components: Option<Components>,
}

/// API metadata block.
#[derive(Debug, Default, Deserialize)]
pub struct Info {
    /// API title.
    #[serde(default)]
    pub title: String,
    /// API version.
    #[serde(default)]
    pub version: String,
    /// Long description.
    pub description: Option<String>,
}

/// Components section containing reusable schemas, responses, parameters and bodies.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Named component schemas in declaration order.
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
    /// Named responses.
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    /// Named parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    /// Named request bodies.
    #[serde(default)]
    pub request_bodies: IndexMap<String, RequestBody>,
}

/// Either an inline object or a `$ref` to a component.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A pointer into `#/components/...`.
    Ref {
        /// The JSON pointer.
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// The object itself.
    Item(T),
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    /// GET operation.
    pub get: Option<Operation>,
    /// PUT operation.
    pub put: Option<Operation>,
    /// POST operation.
    pub post: Option<Operation>,
    /// DELETE operation.
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    pub options: Option<Operation>,
    /// HEAD operation.
    pub head: Option<Operation>,
    /// PATCH operation.
    pub patch: Option<Operation>,
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
}

/// An API operation (endpoint).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Unique operation name.
    pub operation_id: Option<String>,
    /// Grouping tags; the first one picks the API class.
    #[serde(default)]
    pub tags: Vec<String>,
    /// One-line summary.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Marked deprecated.
    #[serde(default)]
    pub deprecated: bool,
    /// Operation-level parameters; these override path-level ones.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Request body.
    pub request_body: Option<RefOr<RequestBody>>,
    /// Responses keyed by status code or `default`.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,
    /// Dropshot marker for paginated list endpoints.
    #[serde(rename = "x-dropshot-pagination")]
    pub x_dropshot_pagination: Option<serde_json::Value>,
    /// Dropshot marker for websocket upgrade endpoints.
    #[serde(rename = "x-dropshot-websocket")]
    pub x_dropshot_websocket: Option<serde_json::Value>,
}

/// A parameter (query, path, header or cookie).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    /// Wire name.
    pub name: String,
    /// The `in` value: path, query, header or cookie.
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter must be sent.
    #[serde(default)]
    pub required: bool,
    /// Parameter description.
    pub description: Option<String>,
    /// Value schema.
    pub schema: Option<Schema>,
}

/// A request body definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestBody {
    /// Whether the body must be sent.
    #[serde(default)]
    pub required: bool,
    /// Body description.
    pub description: Option<String>,
    /// Media types offered.
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// A response definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    /// Response description.
    pub description: Option<String>,
    /// Media types returned; empty for bodyless responses.
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Deserialize)]
pub struct MediaType {
    /// Payload schema.
    pub schema: Option<Schema>,
}

/// JSON Schema node as used inside OpenAPI documents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The type of the schema (string, number, integer, boolean, object, array, null).
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// Reference to another schema.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    /// Short title.
    pub title: Option<String>,
    /// Long description; becomes a docstring.
    pub description: Option<String>,

    /// Format hint (e.g., date-time, uuid, byte).
    pub format: Option<String>,

    /// Properties for object types, in declaration order.
    pub properties: Option<IndexMap<String, Schema>>,

    /// Required property names for object types.
    #[serde(default)]
    pub required: Vec<String>,

    /// Item schema for array types.
    pub items: Option<Box<Schema>>,

    /// Enum values (can be strings, integers, floats, booleans, or null).
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<EnumValue>>,

    /// Exactly-one-of union branches.
    #[serde(rename = "oneOf")]
    pub one_of: Option<Vec<Schema>>,

    /// Any-of union branches.
    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<Schema>>,

    /// Intersection; only the single-member form is supported.
    #[serde(rename = "allOf")]
    pub all_of: Option<Vec<Schema>>,

    /// Additional properties for object types (map/dict types).
    pub additional_properties: Option<AdditionalProperties>,

    /// Constant value; treated like a single-value enum.
    #[serde(rename = "const")]
    pub const_value: Option<EnumValue>,

    /// Default value.
    pub default: Option<serde_json::Value>,

    /// OpenAPI 3.0 nullable flag (3.1 uses type arrays instead).
    pub nullable: Option<bool>,

    /// Minimum array length; sizes array examples.
    pub min_items: Option<u64>,

    /// Marked deprecated.
    #[serde(default)]
    pub deprecated: bool,

    /// Marked read-only.
    #[serde(default)]
    pub read_only: bool,
}

/// Enum value can be string, integer, float, boolean, or null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    /// String value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// `null`
    Null,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// `"type": "string"`
    Single(String),
    /// `"type": ["string", "null"]`
    Multiple(Vec<String>),
}

/// Additional properties can be a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` or `false`
    Bool(bool),
    /// Schema of every value.
    Schema(Box<Schema>),
}

impl OpenApiSpec {
    /// Parse an OpenAPI spec from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GenError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Component schemas, when the document has a components section.
    pub fn schemas(&self) -> Option<&IndexMap<String, Schema>> {
        self.components.as_ref().map(|c| &c.schemas)
    }
}

impl PathItem {
    /// Operations on this path in lexical method order.
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("delete", self.delete.as_ref()),
            ("get", self.get.as_ref()),
            ("head", self.head.as_ref()),
            ("options", self.options.as_ref()),
            ("patch", self.patch.as_ref()),
            ("post", self.post.as_ref()),
            ("put", self.put.as_ref()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|op| (method, op)))
        .collect()
    }
}

impl EnumValue {
    /// Render the value as the string used for naming.
    pub fn as_name_source(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
        }
    }
}

impl Schema {
    /// The single declared type, ignoring a `null` member of a type array.
    ///
    /// Returns `Err` with the offending list when several non-null types are declared.
    pub fn primary_type(&self) -> Result<Option<&str>, Vec<String>> {
        match &self.schema_type {
            None => Ok(None),
            Some(SchemaType::Single(t)) => Ok(Some(t.as_str())),
            Some(SchemaType::Multiple(types)) => {
                let non_null: Vec<&String> = types.iter().filter(|t| *t != "null").collect();
                match non_null.as_slice() {
                    [] => Ok(Some("null")),
                    [single] => Ok(Some(single.as_str())),
                    _ => Err(types.clone()),
                }
            }
        }
    }

    /// Check if this schema is nullable (nullable flag or `null` in a type array).
    ///
    /// `null` branches of unions are handled by the classifier.
    pub fn is_nullable(&self) -> bool {
        if self.nullable == Some(true) {
            return true;
        }
        matches!(&self.schema_type, Some(SchemaType::Multiple(types)) if types.iter().any(|t| t == "null"))
    }

    /// Whether the schema is exactly `{"type": "null"}`.
    pub fn is_null_type(&self) -> bool {
        matches!(&self.schema_type, Some(SchemaType::Single(t)) if t == "null")
    }

    /// The union branches, preferring `oneOf` over `anyOf`.
    pub fn union_branches(&self) -> Option<(&'static str, &[Schema])> {
        if let Some(branches) = &self.one_of {
            return Some(("oneOf", branches.as_slice()));
        }
        self.any_of
            .as_ref()
            .map(|branches| ("anyOf", branches.as_slice()))
    }

    /// The single enum value of this node, counting `const`.
    pub fn single_enum_value(&self) -> Option<&EnumValue> {
        if let Some(value) = &self.const_value {
            return Some(value);
        }
        match self.enum_values.as_deref() {
            Some([value]) => Some(value),
            _ => None,
        }
    }

    /// Whether `name` is listed as required.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}
