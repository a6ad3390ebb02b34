//! Vendor extension attributes - out-of-band metadata on schema nodes.
//!
//! Attributes are stored under `X-`-prefixed keys: field, reasoning, and
//! system prompts, plus the standard `description` field. The system prompt
//! lives at the document root; the others sit on property nodes, located by
//! a shallow substring match over the root `properties` mapping. Deep or
//! wildcard patterns (`items.*.title`) are deliberately out of scope.

use serde_json::Value;

use crate::error::SchemaError;
use crate::types::json_type_name;

/// An extension attribute the engine knows how to read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKey {
    /// Per-field prompt, stored as `X-field-prompt`.
    FieldPrompt,
    /// Per-field reasoning prompt, stored as `X-reasoning-prompt`.
    ReasoningPrompt,
    /// Document-level prompt, stored as `X-system-prompt` at the root.
    SystemPrompt,
    /// The standard JSON Schema `description` field.
    Description,
}

impl ExtensionKey {
    /// Parse a key name. Returns `None` for unrecognized keys.
    pub fn parse(s: &str) -> Option<ExtensionKey> {
        match s {
            "field-prompt" => Some(ExtensionKey::FieldPrompt),
            "reasoning-prompt" => Some(ExtensionKey::ReasoningPrompt),
            "system-prompt" => Some(ExtensionKey::SystemPrompt),
            "description" => Some(ExtensionKey::Description),
            _ => None,
        }
    }

    /// The key under which the attribute is stored in the document.
    pub fn storage_key(&self) -> &'static str {
        match self {
            ExtensionKey::FieldPrompt => "X-field-prompt",
            ExtensionKey::ReasoningPrompt => "X-reasoning-prompt",
            ExtensionKey::SystemPrompt => "X-system-prompt",
            ExtensionKey::Description => "description",
        }
    }

    /// The spelling accepted by [`ExtensionKey::parse`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKey::FieldPrompt => "field-prompt",
            ExtensionKey::ReasoningPrompt => "reasoning-prompt",
            ExtensionKey::SystemPrompt => "system-prompt",
            ExtensionKey::Description => "description",
        }
    }
}

/// Read an extension attribute.
///
/// `system-prompt` is read from the document root; the pattern is ignored.
/// For property-scoped keys the first root property whose name equals the
/// pattern or contains it as a substring is consulted, and `field-prompt`
/// falls back to the property's `description` so callers get the best
/// available human-readable hint.
///
/// Returns `Ok(None)` when no property matches or the attribute is unset.
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` if `doc` is not an object.
pub fn get_attr(
    doc: &Value,
    pattern: &str,
    key: ExtensionKey,
) -> Result<Option<String>, SchemaError> {
    let map = require_object(doc)?;

    if key == ExtensionKey::SystemPrompt {
        return Ok(attr_string(doc, key.storage_key()));
    }

    let Some((_, node)) = find_property(map, pattern) else {
        return Ok(None);
    };

    let value = attr_string(node, key.storage_key());
    if value.is_none() && key == ExtensionKey::FieldPrompt {
        return Ok(attr_string(node, ExtensionKey::Description.storage_key()));
    }
    Ok(value)
}

/// Write an extension attribute, returning a new document.
///
/// Copy-on-write: the input document is never mutated, so it stays safe to
/// share across concurrent callers. `system-prompt` is written at the root;
/// property-scoped keys use the same shallow match as [`get_attr`].
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` if `doc` is not an object, and
/// `SchemaError::PropertyNotFound` when a property-scoped pattern matches
/// nothing (the write is never silently dropped).
pub fn set_attr(
    doc: &Value,
    pattern: &str,
    key: ExtensionKey,
    value: &str,
) -> Result<Value, SchemaError> {
    let map = require_object(doc)?;

    let mut result = map.clone();

    if key == ExtensionKey::SystemPrompt {
        result.insert(
            key.storage_key().to_string(),
            Value::String(value.to_string()),
        );
        return Ok(Value::Object(result));
    }

    let name = find_property(map, pattern)
        .map(|(name, _)| name.to_string())
        .ok_or_else(|| SchemaError::PropertyNotFound {
            pattern: pattern.to_string(),
        })?;

    let node = result
        .get_mut("properties")
        .and_then(Value::as_object_mut)
        .and_then(|props| props.get_mut(&name))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| SchemaError::PropertyNotFound {
            pattern: pattern.to_string(),
        })?;
    node.insert(
        key.storage_key().to_string(),
        Value::String(value.to_string()),
    );

    Ok(Value::Object(result))
}

/// First root property whose name equals the pattern or contains it as a
/// substring, in key order. Shallow by contract.
fn find_property<'a>(
    map: &'a serde_json::Map<String, Value>,
    pattern: &str,
) -> Option<(&'a str, &'a Value)> {
    let properties = map.get("properties")?.as_object()?;
    properties
        .iter()
        .find(|(name, _)| name.as_str() == pattern || name.contains(pattern))
        .map(|(name, node)| (name.as_str(), node))
}

fn attr_string(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

fn require_object(doc: &Value) -> Result<&serde_json::Map<String, Value>, SchemaError> {
    doc.as_object().ok_or_else(|| SchemaError::InvalidSchema {
        found: json_type_name(doc).to_string(),
    })
}
