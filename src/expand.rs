//! Reference expansion - rewrites a schema into a fully dereferenced tree.
//!
//! Every local `$ref` is replaced by its (recursively expanded) target,
//! single-member `allOf` compositions are merged into their parent, and
//! `anyOf` branches are expanded in place. A pointer already on the active
//! expansion stack is left as an unexpanded `$ref` marker instead of being
//! followed again, which is what makes self-referential schemas terminate
//! without a recursion-depth limit.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::types::{json_type_name, NodeShape};

/// The outcome of expanding a document.
///
/// `cycles` lists the pointers the cycle guard refused to follow, in
/// first-seen order. Their `$ref` markers remain in `schema`; callers that
/// need a marker-free tree must check [`Expansion::is_complete`] instead of
/// assuming one.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// The expanded tree.
    pub schema: Value,
    /// Pointers left unexpanded to break reference cycles.
    pub cycles: Vec<String>,
}

impl Expansion {
    /// True when no cyclic `$ref` markers remain in the tree.
    pub fn is_complete(&self) -> bool {
        self.cycles.is_empty()
    }
}

/// Traversal state: the root document for pointer resolution plus the stack
/// of pointers currently being expanded. Allocated per call; never shared.
struct ExpandContext<'a> {
    root: &'a Value,
    stack: Vec<String>,
    cycles: Vec<String>,
}

/// Expand a schema document.
///
/// Pure over its input; the returned tree shares no structure with `doc`.
/// Re-visiting the same pointer along a different path is legal and
/// re-expands it; only a pointer already on the *active* stack becomes a
/// marker.
///
/// # Errors
///
/// `InvalidSchema` if `doc` is not an object, `UnsupportedReference` for
/// non-local pointers, `ReferenceNotFound` for missing targets,
/// `UnsupportedComposition` for `allOf` with more than one member, and
/// `UnrecognizedNodeShape` for nodes without a known discriminator.
pub fn expand(doc: &Value) -> Result<Expansion, SchemaError> {
    if !doc.is_object() {
        return Err(SchemaError::InvalidSchema {
            found: json_type_name(doc).to_string(),
        });
    }

    let mut ctx = ExpandContext {
        root: doc,
        stack: Vec::new(),
        cycles: Vec::new(),
    };
    let schema = expand_value(doc, "", &mut ctx)?;

    Ok(Expansion {
        schema,
        cycles: ctx.cycles,
    })
}

/// Resolve a local JSON Pointer (`#/a/b/c`) against a document.
///
/// JSON Pointer escapes are honored (`~1` for `/`, `~0` for `~`); numeric
/// segments index into arrays.
///
/// # Errors
///
/// Returns `UnsupportedReference` unless the pointer starts with `#/`, and
/// `ReferenceNotFound` when a segment does not resolve.
pub fn resolve_pointer<'a>(root: &'a Value, pointer: &str) -> Result<&'a Value, SchemaError> {
    let Some(path) = pointer.strip_prefix("#/") else {
        return Err(SchemaError::UnsupportedReference {
            pointer: pointer.to_string(),
        });
    };

    let mut current = root;
    for segment in path.split('/') {
        let key = segment.replace("~1", "/").replace("~0", "~");
        let next = match current {
            Value::Object(map) => map.get(key.as_str()),
            Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| SchemaError::ReferenceNotFound {
            pointer: pointer.to_string(),
            segment: key,
        })?;
    }
    Ok(current)
}

/// The unescaped last segment of a local pointer, if it has one.
pub(crate) fn trailing_segment(pointer: &str) -> Option<String> {
    let path = pointer.strip_prefix("#/")?;
    let segment = path.rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }
    Some(segment.replace("~1", "/").replace("~0", "~"))
}

// --- Internal implementation ---

fn expand_value(
    value: &Value,
    path: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Value, SchemaError> {
    let Some(map) = value.as_object() else {
        return Err(SchemaError::UnrecognizedNodeShape {
            path: path.to_string(),
        });
    };

    match NodeShape::classify(value, path)? {
        NodeShape::Ref => expand_ref(map, path, ctx),
        NodeShape::AllOf => expand_all_of(map, path, ctx),
        NodeShape::AnyOf => expand_any_of(map, path, ctx),
        _ => expand_typed(map, path, ctx),
    }
}

fn expand_ref(
    map: &Map<String, Value>,
    path: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Value, SchemaError> {
    let Some(pointer) = map.get("$ref").and_then(Value::as_str) else {
        return Err(SchemaError::UnrecognizedNodeShape {
            path: path.to_string(),
        });
    };

    // Cycle guard: a pointer already being expanded stays as a marker.
    if ctx.stack.iter().any(|p| p == pointer) {
        if !ctx.cycles.iter().any(|p| p == pointer) {
            ctx.cycles.push(pointer.to_string());
        }
        let mut marker = Map::new();
        marker.insert("$ref".to_string(), Value::String(pointer.to_string()));
        return Ok(Value::Object(marker));
    }

    let root = ctx.root;
    let target = resolve_pointer(root, pointer)?;

    ctx.stack.push(pointer.to_string());
    let expanded = expand_value(target, path, ctx);
    ctx.stack.pop();
    expanded
}

fn expand_all_of(
    map: &Map<String, Value>,
    path: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Value, SchemaError> {
    let members = map
        .get("allOf")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    // Only single-member allOf merges automatically; anything wider needs a
    // merge strategy this engine deliberately does not define.
    if members.len() != 1 {
        return Err(SchemaError::UnsupportedComposition {
            path: format!("{}/allOf", path),
            members: members.len(),
        });
    }

    let expanded = expand_value(&members[0], &format!("{}/allOf/0", path), ctx)?;
    let Value::Object(mut merged) = expanded else {
        return Ok(expanded);
    };

    // Hoist the member's fields, then lay the parent's own keys on top.
    for (key, value) in map {
        if key == "allOf" {
            continue;
        }
        let child_path = format!("{}/{}", path, key);

        if key == "required" {
            merge_required(&mut merged, value);
        } else if let Some(expanded_child) = expand_structural(key, value, &child_path, ctx)? {
            merged.insert(key.clone(), expanded_child);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }

    Ok(Value::Object(merged))
}

/// Union the parent's `required` entries with the hoisted member's, parent
/// entries first.
fn merge_required(merged: &mut Map<String, Value>, parent_required: &Value) {
    let mut combined: Vec<Value> = parent_required
        .as_array()
        .cloned()
        .unwrap_or_default();

    if let Some(member_required) = merged.get("required").and_then(Value::as_array) {
        for entry in member_required {
            if !combined.contains(entry) {
                combined.push(entry.clone());
            }
        }
    }
    merged.insert("required".to_string(), Value::Array(combined));
}

fn expand_any_of(
    map: &Map<String, Value>,
    path: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Value, SchemaError> {
    let mut result = Map::new();

    for (key, value) in map {
        let child_path = format!("{}/{}", path, key);

        if key == "anyOf" {
            // Branches share the ancestor stack but no other cycle state: a
            // branch may re-enter a pointer a sibling also visited.
            result.insert(key.clone(), expand_member_list(value, &child_path, ctx)?);
        } else if let Some(expanded) = expand_structural(key, value, &child_path, ctx)? {
            result.insert(key.clone(), expanded);
        } else {
            result.insert(key.clone(), value.clone());
        }
    }

    Ok(Value::Object(result))
}

fn expand_typed(
    map: &Map<String, Value>,
    path: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Value, SchemaError> {
    let mut result = Map::new();

    for (key, value) in map {
        let child_path = format!("{}/{}", path, key);

        if let Some(expanded) = expand_structural(key, value, &child_path, ctx)? {
            result.insert(key.clone(), expanded);
        } else {
            result.insert(key.clone(), value.clone());
        }
    }

    Ok(Value::Object(result))
}

/// Expand the value of a key that holds nested schemas; `None` for keys that
/// carry plain data (`enum`, `default`, annotations) which are copied
/// verbatim.
fn expand_structural(
    key: &str,
    value: &Value,
    child_path: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Option<Value>, SchemaError> {
    match key {
        "properties" | "$defs" | "definitions" => {
            Ok(Some(expand_member_map(value, child_path, ctx)?))
        }
        "items" => Ok(Some(expand_value(value, child_path, ctx)?)),
        "prefixItems" => Ok(Some(expand_member_list(value, child_path, ctx)?)),
        "additionalProperties" if value.is_object() => {
            Ok(Some(expand_value(value, child_path, ctx)?))
        }
        _ => Ok(None),
    }
}

fn expand_member_map(
    value: &Value,
    path: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Value, SchemaError> {
    let Some(members) = value.as_object() else {
        return Ok(value.clone());
    };

    let mut result = Map::new();
    for (name, member) in members {
        let member_path = format!("{}/{}", path, name);
        result.insert(name.clone(), expand_value(member, &member_path, ctx)?);
    }
    Ok(Value::Object(result))
}

fn expand_member_list(
    value: &Value,
    path: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Value, SchemaError> {
    let Some(members) = value.as_array() else {
        return Ok(value.clone());
    };

    let mut result = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let member_path = format!("{}/{}", path, i);
        result.push(expand_value(member, &member_path, ctx)?);
    }
    Ok(Value::Array(result))
}
