//! Schema Engine
//!
//! JSON Schema normalization, content-derived identity, and validator code
//! generation.
//!
//! The engine takes an arbitrary (possibly self-referential) JSON Schema
//! document, expands its local `$ref` pointers and compositions, computes
//! stable content-derived identifiers for it, reads and writes vendor
//! extension metadata, and translates named schemas into Zod validator
//! source.
//!
//! # Example
//!
//! ```
//! use schema_engine::{expand, schema_id, schema_data_id};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "$defs": {
//!         "Name": { "type": "string" }
//!     },
//!     "properties": {
//!         "name": { "$ref": "#/$defs/Name" }
//!     },
//!     "required": ["name"]
//! });
//!
//! let expansion = expand(&schema).unwrap();
//! assert!(expansion.is_complete());
//! assert_eq!(expansion.schema["properties"]["name"], json!({"type": "string"}));
//!
//! // Identifiers are stable across key reordering; schema_data_id is also
//! // stable across documentation edits.
//! assert!(schema_id(&schema).unwrap().starts_with("sch_id_"));
//! assert!(schema_data_id(&schema).unwrap().starts_with("sch_data_id_"));
//! ```
//!
//! # Cycle policy
//!
//! Expansion follows a reference until it repeats on the active expansion
//! stack, then substitutes the unexpanded `$ref` marker instead of recursing.
//! The pointers left behind are listed in [`Expansion::cycles`], so a
//! self-referential schema (a tree node holding its own children, say)
//! terminates without a recursion-depth limit, and callers must explicitly
//! confront the unresolved markers rather than stumble over them.

mod canonical;
mod codegen;
mod error;
mod expand;
mod extensions;
mod identity;
mod linter;
mod loader;
mod table;
mod types;
mod validator;

pub use canonical::canonicalize;
pub use codegen::generate_module;
pub use error::{LoadError, SchemaError, ValidateError, ValidationFault};
pub use expand::{expand, resolve_pointer, Expansion};
pub use extensions::{get_attr, set_attr, ExtensionKey};
pub use identity::{
    schema_data_id, schema_id, short_digest, strip_authoring_fields, SCHEMA_DATA_ID_PREFIX,
    SCHEMA_ID_PREFIX,
};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{load_schema, load_schema_str};
pub use table::{DefinitionTable, SkippedDefinition};
pub use types::{json_type_name, NodeShape, AUTHORING_FIELDS, EXTENSION_PREFIX, KNOWN_EXTENSION_KEYS};
pub use validator::validate_instance;
