//! Named schema collection for code generation.
//!
//! A `$ref` whose trailing pointer segment starts with an ASCII uppercase
//! letter names a reusable declaration. The table maps each such name to its
//! resolved node, in document order, and keeps the enclosing document around
//! as resolution context for anonymous references.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::expand::{resolve_pointer, trailing_segment};
use crate::types::json_type_name;

/// A duplicate name that was not collected.
///
/// Recorded instead of dropped silently; the linter reports these as W001.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDefinition {
    /// The contested name.
    pub name: String,
    /// The pointer that lost (the first occurrence kept its entry).
    pub pointer: String,
}

/// Named schemas found in one source document, first occurrence wins.
#[derive(Debug, Clone)]
pub struct DefinitionTable {
    document: Value,
    entries: Map<String, Value>,
    pointers: Vec<(String, String)>,
    skipped: Vec<SkippedDefinition>,
}

impl DefinitionTable {
    /// Collect named schemas from a document.
    ///
    /// Walks the document in key order, resolving every local `$ref` whose
    /// trailing segment is capitalized. The same pointer seen twice is one
    /// entry; the same name from a different pointer is recorded as a skip.
    /// Non-local references are not collected.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` if `doc` is not an object; `ReferenceNotFound` if a
    /// named reference does not resolve.
    pub fn from_document(doc: &Value) -> Result<DefinitionTable, SchemaError> {
        if !doc.is_object() {
            return Err(SchemaError::InvalidSchema {
                found: json_type_name(doc).to_string(),
            });
        }

        let mut table = DefinitionTable {
            document: doc.clone(),
            entries: Map::new(),
            pointers: Vec::new(),
            skipped: Vec::new(),
        };
        table.collect(doc)?;
        Ok(table)
    }

    /// The enclosing document, used to resolve anonymous references.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The resolved node for a name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// True if the table holds an entry for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries in collection order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// The source pointer each entry was collected from, in the same order
    /// as [`DefinitionTable::iter`].
    pub fn pointers(&self) -> &[(String, String)] {
        &self.pointers
    }

    /// Duplicate names that lost to an earlier occurrence.
    pub fn skipped(&self) -> &[SkippedDefinition] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn collect(&mut self, value: &Value) -> Result<(), SchemaError> {
        match value {
            Value::Object(map) => {
                if let Some(pointer) = map.get("$ref").and_then(Value::as_str) {
                    self.collect_ref(pointer)?;
                }
                for child in map.values() {
                    self.collect(child)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.collect(item)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn collect_ref(&mut self, pointer: &str) -> Result<(), SchemaError> {
        let Some(name) = trailing_segment(pointer).filter(|s| is_named(s)) else {
            return Ok(());
        };

        if let Some((_, kept)) = self.pointers.iter().find(|(n, _)| *n == name) {
            if kept != pointer {
                self.skipped.push(SkippedDefinition {
                    name,
                    pointer: pointer.to_string(),
                });
            }
            return Ok(());
        }

        let node = resolve_pointer(&self.document, pointer)?.clone();
        self.entries.insert(name.clone(), node);
        self.pointers.push((name, pointer.to_string()));
        Ok(())
    }
}

/// Naming convention: a leading ASCII uppercase letter marks a segment as a
/// declaration name.
pub(crate) fn is_named(segment: &str) -> bool {
    segment.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_capitalized_refs_in_document_order() {
        let doc = json!({
            "type": "object",
            "$defs": {
                "Task": {"type": "object", "properties": {}},
                "Label": {"type": "string"}
            },
            "properties": {
                "task": {"$ref": "#/$defs/Task"},
                "label": {"$ref": "#/$defs/Label"}
            }
        });

        let table = DefinitionTable::from_document(&doc).unwrap();
        let names: Vec<&String> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Task", "Label"]);
        assert_eq!(table.get("Label"), Some(&json!({"type": "string"})));
        assert_eq!(
            table.pointers(),
            &[
                ("Task".to_string(), "#/$defs/Task".to_string()),
                ("Label".to_string(), "#/$defs/Label".to_string()),
            ]
        );
        assert!(table.skipped().is_empty());
    }

    #[test]
    fn lowercase_segments_are_not_collected() {
        let doc = json!({
            "$defs": {"shared": {"type": "string"}},
            "type": "object",
            "properties": {
                "x": {"$ref": "#/$defs/shared"}
            }
        });

        let table = DefinitionTable::from_document(&doc).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn same_pointer_twice_is_one_entry() {
        let doc = json!({
            "$defs": {"Name": {"type": "string"}},
            "type": "object",
            "properties": {
                "a": {"$ref": "#/$defs/Name"},
                "b": {"$ref": "#/$defs/Name"}
            }
        });

        let table = DefinitionTable::from_document(&doc).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.skipped().is_empty());
    }

    #[test]
    fn same_name_from_different_pointer_is_skipped() {
        let doc = json!({
            "$defs": {"Item": {"type": "string"}},
            "definitions": {"Item": {"type": "integer"}},
            "type": "object",
            "properties": {
                "a": {"$ref": "#/$defs/Item"},
                "b": {"$ref": "#/definitions/Item"}
            }
        });

        let table = DefinitionTable::from_document(&doc).unwrap();
        assert_eq!(table.len(), 1);
        // First occurrence won.
        assert_eq!(table.get("Item"), Some(&json!({"type": "string"})));
        assert_eq!(
            table.skipped(),
            &[SkippedDefinition {
                name: "Item".to_string(),
                pointer: "#/definitions/Item".to_string(),
            }]
        );
    }

    #[test]
    fn refs_inside_collected_definitions_are_found() {
        // The walk covers $defs content, so a named ref used only inside
        // another definition still gets an entry.
        let doc = json!({
            "$defs": {
                "Outer": {
                    "type": "object",
                    "properties": {"inner": {"$ref": "#/$defs/Inner"}}
                },
                "Inner": {"type": "boolean"}
            },
            "$ref": "#/$defs/Outer"
        });

        let table = DefinitionTable::from_document(&doc).unwrap();
        assert!(table.contains("Outer"));
        assert!(table.contains("Inner"));
    }

    #[test]
    fn self_referential_definition_is_collected_once() {
        let doc = json!({
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "children": {
                            "type": "array",
                            "items": {"$ref": "#/$defs/Node"}
                        }
                    }
                }
            },
            "$ref": "#/$defs/Node"
        });

        let table = DefinitionTable::from_document(&doc).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains("Node"));
    }

    #[test]
    fn missing_named_target_errors() {
        let doc = json!({
            "type": "object",
            "properties": {"x": {"$ref": "#/$defs/Gone"}}
        });

        let result = DefinitionTable::from_document(&doc);
        assert!(matches!(result, Err(SchemaError::ReferenceNotFound { .. })));
    }

    #[test]
    fn non_local_refs_are_not_collected() {
        let doc = json!({
            "type": "object",
            "properties": {
                "x": {"$ref": "https://example.com/schema.json#/$defs/Name"}
            }
        });

        let table = DefinitionTable::from_document(&doc).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn non_object_document_errors() {
        let result = DefinitionTable::from_document(&json!("no"));
        assert!(matches!(
            result,
            Err(SchemaError::InvalidSchema { found }) if found == "string"
        ));
    }
}
