//! Schema linting - static analysis of schema files.
//!
//! Checks schema files for:
//! - JSON syntax errors (E001)
//! - non-local `$ref` pointers (E002)
//! - reference targets that do not resolve (E003)
//! - `allOf` compositions expansion cannot merge (E004)
//! - nodes outside the supported vocabulary (E005)
//! - duplicate named schemas that codegen would skip (W001)
//! - unknown `X-` extension keys (W002)

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::expand::resolve_pointer;
use crate::loader::load_schema;
use crate::table::DefinitionTable;
use crate::types::{NodeShape, KNOWN_EXTENSION_KEYS};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/id")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_schema_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();

    // Try to load the file (checks syntax)
    let schema = match load_schema(file) {
        Ok(s) => s,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E001".to_string(),
                file: file.to_path_buf(),
                path: "/".to_string(),
                message: format!("syntax error: {}", e),
            });
            return FileResult {
                file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    check_node(&schema, file, "", &schema, &mut diagnostics);
    check_extension_keys(&schema, file, "", &mut diagnostics);
    check_duplicate_names(&schema, file, &mut diagnostics);

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

/// Check a node standing in a schema position, recursing into the positions
/// expansion would visit.
fn check_node(
    value: &Value,
    file: &Path,
    path: &str,
    root: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let shape = match NodeShape::classify(value, path) {
        Ok(shape) => shape,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E005".to_string(),
                file: file.to_path_buf(),
                path: display_path(path),
                message: e.to_string(),
            });
            return;
        }
    };
    let Some(map) = value.as_object() else {
        return;
    };

    match shape {
        NodeShape::Ref => {
            if let Some(pointer) = map.get("$ref").and_then(Value::as_str) {
                check_single_ref(pointer, file, path, root, diagnostics);
            }
        }
        NodeShape::AllOf | NodeShape::AnyOf => {
            let key = if shape == NodeShape::AllOf {
                "allOf"
            } else {
                "anyOf"
            };
            let members = map
                .get(key)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            if shape == NodeShape::AllOf && members.len() != 1 {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    code: "E004".to_string(),
                    file: file.to_path_buf(),
                    path: display_path(&format!("{}/allOf", path)),
                    message: format!(
                        "allOf with {} member(s) cannot be expanded; only a single member merges",
                        members.len()
                    ),
                });
            }
            for (i, member) in members.iter().enumerate() {
                let member_path = format!("{}/{}/{}", path, key, i);
                check_node(member, file, &member_path, root, diagnostics);
            }
        }
        _ => {}
    }

    // Structural keys carry nested schemas regardless of the node's own
    // shape ($defs next to a root $ref, for instance).
    for (key, child) in map {
        let child_path = format!("{}/{}", path, key);
        match key.as_str() {
            "properties" | "$defs" | "definitions" => {
                if let Some(members) = child.as_object() {
                    for (name, member) in members {
                        let member_path = format!("{}/{}", child_path, name);
                        check_node(member, file, &member_path, root, diagnostics);
                    }
                }
            }
            "items" => check_node(child, file, &child_path, root, diagnostics),
            "prefixItems" => {
                if let Some(members) = child.as_array() {
                    for (i, member) in members.iter().enumerate() {
                        let member_path = format!("{}/{}", child_path, i);
                        check_node(member, file, &member_path, root, diagnostics);
                    }
                }
            }
            "additionalProperties" if child.is_object() => {
                check_node(child, file, &child_path, root, diagnostics);
            }
            _ => {}
        }
    }
}

/// Check a single $ref value: local pointers must resolve, anything else is
/// unsupported.
fn check_single_ref(
    pointer: &str,
    file: &Path,
    path: &str,
    root: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !pointer.starts_with("#/") {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            code: "E002".to_string(),
            file: file.to_path_buf(),
            path: display_path(path),
            message: format!("unsupported reference: {} (only #/ pointers)", pointer),
        });
        return;
    }

    if resolve_pointer(root, pointer).is_err() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            code: "E003".to_string(),
            file: file.to_path_buf(),
            path: display_path(path),
            message: format!("reference target not found: {}", pointer),
        });
    }
}

/// Flag `X-` keys that are not one of the documented attribute spellings.
fn check_extension_keys(
    value: &Value,
    file: &Path,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key.starts_with("X-") && !KNOWN_EXTENSION_KEYS.contains(&key.as_str()) {
                    diagnostics.push(Diagnostic {
                        severity: Severity::Warning,
                        code: "W002".to_string(),
                        file: file.to_path_buf(),
                        path: display_path(&format!("{}/{}", path, key)),
                        message: format!(
                            "unknown extension key \"{}\": expected {}",
                            key,
                            KNOWN_EXTENSION_KEYS.join(", ")
                        ),
                    });
                }
                check_extension_keys(child, file, &format!("{}/{}", path, key), diagnostics);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                check_extension_keys(item, file, &format!("{}/{}", path, i), diagnostics);
            }
        }
        _ => {}
    }
}

/// Warn on duplicate named schemas; codegen keeps the first occurrence and
/// skips the rest.
fn check_duplicate_names(schema: &Value, file: &Path, diagnostics: &mut Vec<Diagnostic>) {
    // Unresolvable names are already covered by E003; only a successful
    // collection can report duplicates.
    let Ok(table) = DefinitionTable::from_document(schema) else {
        return;
    };

    for skip in table.skipped() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            code: "W001".to_string(),
            file: file.to_path_buf(),
            path: "/".to_string(),
            message: format!(
                "duplicate named schema \"{}\" at {} (first occurrence wins)",
                skip.name, skip.pointer
            ),
        });
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Collect all .json files in a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn lint_valid_schema() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "properties": {{
                "id": {{ "type": "string" }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not valid json }}").unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_non_local_ref() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "properties": {{
                "data": {{ "$ref": "https://example.com/other.json#/$defs/Thing" }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().any(|d| d.code == "E002"));
    }

    #[test]
    fn lint_broken_internal_ref() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"{{
            "type": "object",
            "properties": {{
                "data": {{ "$ref": "#/$defs/missing" }}
            }}
        }}"##
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().any(|d| d.code == "E003"));
    }

    #[test]
    fn lint_multi_member_allof() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "allOf": [
                {{ "type": "object", "properties": {{}} }},
                {{ "type": "object", "properties": {{}} }}
            ]
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert!(result.diagnostics.iter().any(|d| d.code == "E004"));
    }

    #[test]
    fn lint_single_member_allof_is_fine() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "allOf": [{{ "type": "object", "properties": {{}} }}]
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Ok);
    }

    #[test]
    fn lint_unrecognized_node_shape() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "properties": {{
                "x": {{ "minimum": 3 }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Error);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "E005" && d.path == "/properties/x"));
    }

    #[test]
    fn lint_defs_next_to_root_ref_are_checked() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"{{
            "$defs": {{
                "Bad": {{ "unknown": true }}
            }},
            "$ref": "#/$defs/Bad"
        }}"##
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert!(result.diagnostics.iter().any(|d| d.code == "E005"));
    }

    #[test]
    fn lint_duplicate_named_schema_warns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"{{
            "$defs": {{ "Item": {{ "type": "string" }} }},
            "definitions": {{ "Item": {{ "type": "integer" }} }},
            "type": "object",
            "properties": {{
                "a": {{ "$ref": "#/$defs/Item" }},
                "b": {{ "$ref": "#/definitions/Item" }}
            }}
        }}"##
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W001"));
    }

    #[test]
    fn lint_unknown_extension_key_warns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "X-custom-thing": "value",
            "properties": {{}}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == "W002" && d.path == "/X-custom-thing"));
    }

    #[test]
    fn lint_known_extension_keys_are_quiet() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
            "type": "object",
            "X-system-prompt": "be kind",
            "properties": {{
                "name": {{ "type": "string", "X-field-prompt": "their name" }}
            }}
        }}"#
        )
        .unwrap();

        let result = lint_file(file.path(), file.path().parent().unwrap());
        assert_eq!(result.status, FileStatus::Ok);
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        let valid_path = dir.path().join("valid.json");
        std::fs::write(&valid_path, r#"{"type": "object", "properties": {}}"#).unwrap();

        let invalid_path = dir.path().join("invalid.json");
        std::fs::write(&invalid_path, "{ not json }").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.json");
        // Schema with a warning only (unknown extension key)
        std::fs::write(
            &file_path,
            r#"{"type": "object", "X-vendor-note": "hi", "properties": {}}"#,
        )
        .unwrap();

        // Non-strict: warnings don't cause failure
        let result = lint(&file_path, false);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        // Strict: warnings cause failure
        let result = lint(&file_path, true);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
