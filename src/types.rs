//! Core types shared across the engine.

use serde_json::Value;

use crate::error::SchemaError;

/// Human-authoring fields stripped before computing `schema_data_id`.
///
/// Edits to these change how a schema reads, not what data it accepts.
pub const AUTHORING_FIELDS: &[&str] = &[
    "description",
    "default",
    "title",
    "required",
    "examples",
    "deprecated",
    "readOnly",
    "writeOnly",
];

/// Prefix marking vendor extension keys.
pub const EXTENSION_PREFIX: &str = "X-";

/// Extension keys the engine reads and writes.
pub const KNOWN_EXTENSION_KEYS: &[&str] = &[
    "X-field-prompt",
    "X-reasoning-prompt",
    "X-system-prompt",
];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The shape of a schema node.
///
/// Exactly one shape is active per node, discriminated by the presence of
/// `type`, `$ref`, `allOf`, or `anyOf`, checked in that priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Array,
    Object,
    Ref,
    AllOf,
    AnyOf,
}

impl NodeShape {
    /// Classify a value standing in a schema position.
    ///
    /// Returns `UnrecognizedNodeShape` when no discriminator is present or
    /// the value is not an object (boolean schemas are outside the supported
    /// vocabulary subset). Callers must surface that error rather than fall
    /// back to a permissive type.
    pub fn classify(value: &Value, path: &str) -> Result<NodeShape, SchemaError> {
        let Some(map) = value.as_object() else {
            return Err(SchemaError::UnrecognizedNodeShape {
                path: path.to_string(),
            });
        };

        if let Some(type_value) = map.get("type") {
            return match type_value.as_str() {
                Some("string") => Ok(NodeShape::String),
                Some("number") => Ok(NodeShape::Number),
                Some("integer") => Ok(NodeShape::Integer),
                Some("boolean") => Ok(NodeShape::Boolean),
                Some("null") => Ok(NodeShape::Null),
                Some("array") => Ok(NodeShape::Array),
                Some("object") => Ok(NodeShape::Object),
                _ => Err(SchemaError::UnrecognizedNodeShape {
                    path: path.to_string(),
                }),
            };
        }
        if matches!(map.get("$ref"), Some(Value::String(_))) {
            return Ok(NodeShape::Ref);
        }
        if matches!(map.get("allOf"), Some(Value::Array(_))) {
            return Ok(NodeShape::AllOf);
        }
        if matches!(map.get("anyOf"), Some(Value::Array(_))) {
            return Ok(NodeShape::AnyOf);
        }

        Err(SchemaError::UnrecognizedNodeShape {
            path: path.to_string(),
        })
    }
}
