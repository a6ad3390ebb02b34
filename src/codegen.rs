//! Validator code generation - schema tree to Zod TypeScript source.
//!
//! One declaration is emitted per named schema in the table. A `$ref` whose
//! trailing segment names a table entry becomes a lazy reference to that
//! declaration (`z.lazy(() => Name)`), which is what lets mutually and
//! self-referential schemas generate without inlining forever; a `$ref` to
//! an anonymous location is inlined by recursing into its target. Output is
//! deterministic: table order for declarations, input key order for object
//! members.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::expand::{resolve_pointer, trailing_segment};
use crate::table::{is_named, DefinitionTable};
use crate::types::NodeShape;

const PREAMBLE: &str = "import { z } from \"zod\";\n";
const INDENT: &str = "  ";

/// Emission state: the pointers currently being inlined anonymously. A
/// repeat on this stack has no name to refer to lazily, so it is a fatal
/// `CircularReference` rather than an infinite recursion.
struct EmitContext<'a> {
    table: &'a DefinitionTable,
    inlining: Vec<String>,
}

/// Generate a TypeScript module with one Zod declaration per table entry.
///
/// With `root`, an additional declaration for the table's enclosing document
/// is appended under the given name. Generating twice from the same table
/// yields byte-identical output.
///
/// # Errors
///
/// `UnrecognizedNodeShape` for nodes outside the supported vocabulary,
/// `UnsupportedComposition` for empty `allOf`/`anyOf`, `UnsupportedReference`
/// and `ReferenceNotFound` for bad pointers, and `CircularReference` for a
/// cycle through an anonymous (uncollected) pointer.
pub fn generate_module(
    table: &DefinitionTable,
    root: Option<&str>,
) -> Result<String, SchemaError> {
    let mut ctx = EmitContext {
        table,
        inlining: Vec::new(),
    };

    let mut out = String::from(PREAMBLE);
    for (name, node) in table.iter() {
        out.push('\n');
        out.push_str("export const ");
        out.push_str(name);
        out.push_str(" = ");
        out.push_str(&emit_node(node, &format!("/{}", name), 0, &mut ctx)?);
        out.push_str(";\n");
    }
    if let Some(name) = root {
        out.push('\n');
        out.push_str("export const ");
        out.push_str(name);
        out.push_str(" = ");
        out.push_str(&emit_node(table.document(), "", 0, &mut ctx)?);
        out.push_str(";\n");
    }
    Ok(out)
}

fn emit_node(
    node: &Value,
    path: &str,
    depth: usize,
    ctx: &mut EmitContext<'_>,
) -> Result<String, SchemaError> {
    let map = node.as_object().ok_or_else(|| {
        SchemaError::UnrecognizedNodeShape {
            path: path.to_string(),
        }
    })?;

    match NodeShape::classify(node, path)? {
        NodeShape::String => emit_string(map, path),
        NodeShape::Number => Ok("z.number()".to_string()),
        NodeShape::Integer => Ok("z.number().int()".to_string()),
        NodeShape::Boolean => Ok("z.boolean()".to_string()),
        NodeShape::Null => Ok("z.null()".to_string()),
        NodeShape::Array => emit_array(map, path, depth, ctx),
        NodeShape::Object => emit_object(map, path, depth, ctx),
        NodeShape::Ref => emit_ref(map, path, depth, ctx),
        NodeShape::AllOf => emit_all_of(map, path, depth, ctx),
        NodeShape::AnyOf => emit_any_of(map, path, depth, ctx),
    }
}

fn emit_string(map: &Map<String, Value>, path: &str) -> Result<String, SchemaError> {
    if let Some(members) = map.get("enum") {
        let members = members.as_array().ok_or_else(|| {
            SchemaError::UnrecognizedNodeShape {
                path: format!("{}/enum", path),
            }
        })?;
        let mut literals = Vec::with_capacity(members.len());
        for (i, member) in members.iter().enumerate() {
            let Value::String(literal) = member else {
                // Non-string enum members are outside the vocabulary subset.
                return Err(SchemaError::UnrecognizedNodeShape {
                    path: format!("{}/enum/{}", path, i),
                });
            };
            literals.push(ts_string(literal));
        }
        return Ok(format!("z.enum([{}])", literals.join(", ")));
    }

    Ok(match map.get("format").and_then(Value::as_str) {
        Some("date") | Some("date-time") => "z.union([z.date(), z.string()])".to_string(),
        Some("uuid") => "z.string().uuid()".to_string(),
        Some("binary") => "z.instanceof(Uint8Array)".to_string(),
        _ => "z.string()".to_string(),
    })
}

fn emit_array(
    map: &Map<String, Value>,
    path: &str,
    depth: usize,
    ctx: &mut EmitContext<'_>,
) -> Result<String, SchemaError> {
    if let Some(prefix) = map.get("prefixItems").and_then(Value::as_array) {
        let mut members = Vec::with_capacity(prefix.len());
        for (i, member) in prefix.iter().enumerate() {
            let member_path = format!("{}/prefixItems/{}", path, i);
            members.push(emit_node(member, &member_path, depth, ctx)?);
        }
        return Ok(format!("z.tuple([{}])", members.join(", ")));
    }

    if let Some(items) = map.get("items") {
        let inner = emit_node(items, &format!("{}/items", path), depth, ctx)?;
        return Ok(format!("z.array({})", inner));
    }

    Ok("z.array(z.unknown())".to_string())
}

fn emit_object(
    map: &Map<String, Value>,
    path: &str,
    depth: usize,
    ctx: &mut EmitContext<'_>,
) -> Result<String, SchemaError> {
    let Some(properties) = map.get("properties").and_then(Value::as_object) else {
        // No declared fields: an open record.
        return Ok("z.record(z.unknown())".to_string());
    };

    if properties.is_empty() {
        return Ok("z.object({})".to_string());
    }

    let required: Vec<&str> = map
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let inner_pad = INDENT.repeat(depth + 1);
    let mut out = String::from("z.object({\n");
    for (name, child) in properties {
        let child_path = format!("{}/properties/{}", path, name);
        let mut expr = emit_node(child, &child_path, depth + 1, ctx)?;
        if !required.contains(&name.as_str()) {
            expr.push_str(".optional()");
        }
        out.push_str(&inner_pad);
        out.push_str(&member_key(name));
        out.push_str(": ");
        out.push_str(&expr);
        out.push_str(",\n");
    }
    out.push_str(&INDENT.repeat(depth));
    out.push_str("})");
    Ok(out)
}

fn emit_ref(
    map: &Map<String, Value>,
    path: &str,
    depth: usize,
    ctx: &mut EmitContext<'_>,
) -> Result<String, SchemaError> {
    let Some(pointer) = map.get("$ref").and_then(Value::as_str) else {
        return Err(SchemaError::UnrecognizedNodeShape {
            path: path.to_string(),
        });
    };

    // A named table entry is referenced lazily, never inlined; this is what
    // makes forward and circular declarations work.
    if let Some(name) = trailing_segment(pointer) {
        if is_named(&name) && ctx.table.contains(&name) {
            return Ok(format!("z.lazy(() => {})", name));
        }
    }

    if ctx.inlining.iter().any(|p| p == pointer) {
        return Err(SchemaError::CircularReference {
            pointer: pointer.to_string(),
        });
    }

    let target = resolve_pointer(ctx.table.document(), pointer)?.clone();
    ctx.inlining.push(pointer.to_string());
    let emitted = emit_node(&target, path, depth, ctx);
    ctx.inlining.pop();
    emitted
}

fn emit_all_of(
    map: &Map<String, Value>,
    path: &str,
    depth: usize,
    ctx: &mut EmitContext<'_>,
) -> Result<String, SchemaError> {
    let members = composition_members(map, "allOf", path)?;

    let mut emitted = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let member_path = format!("{}/allOf/{}", path, i);
        emitted.push(emit_node(member, &member_path, depth, ctx)?);
    }

    // Fold left so arity beyond two nests pairwise.
    let mut result = emitted.remove(0);
    for member in emitted {
        result = format!("z.intersection({}, {})", result, member);
    }
    Ok(result)
}

fn emit_any_of(
    map: &Map<String, Value>,
    path: &str,
    depth: usize,
    ctx: &mut EmitContext<'_>,
) -> Result<String, SchemaError> {
    let members = composition_members(map, "anyOf", path)?;

    let mut emitted = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let member_path = format!("{}/anyOf/{}", path, i);
        emitted.push(emit_node(member, &member_path, depth, ctx)?);
    }

    if emitted.len() == 1 {
        return Ok(emitted.remove(0));
    }
    Ok(format!("z.union([{}])", emitted.join(", ")))
}

fn composition_members<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a [Value], SchemaError> {
    let members = map
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if members.is_empty() {
        return Err(SchemaError::UnsupportedComposition {
            path: format!("{}/{}", path, key),
            members: 0,
        });
    }
    Ok(members)
}

/// Object member key: bare when it is a valid identifier, quoted otherwise.
fn member_key(name: &str) -> String {
    let mut chars = name.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        name.to_string()
    } else {
        ts_string(name)
    }
}

/// A double-quoted TypeScript string literal.
fn ts_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s))
}
