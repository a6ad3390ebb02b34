//! Error types for schema expansion, identity, and code generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the core engine: expansion, identifiers, extension attributes,
/// and code generation.
///
/// All variants are deterministic input errors; nothing here is transient or
/// retryable.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema: expected an object, got {found}")]
    InvalidSchema { found: String },

    #[error("reference not found: {pointer} (no segment \"{segment}\")")]
    ReferenceNotFound { pointer: String, segment: String },

    #[error("unsupported reference \"{pointer}\": only local #/ pointers are supported")]
    UnsupportedReference { pointer: String },

    #[error("unsupported composition at {path}: cannot merge allOf with {members} member(s)")]
    UnsupportedComposition { path: String, members: usize },

    #[error("unrecognized node shape at {path}: expected type, $ref, allOf, or anyOf")]
    UnrecognizedNodeShape { path: String },

    #[error("no property matching \"{pattern}\" in document root")]
    PropertyNotFound { pattern: String },

    #[error("circular reference through \"{pointer}\" cannot be inlined")]
    CircularReference { pointer: String },
}

impl SchemaError {
    /// Returns the exit code for this error type.
    ///
    /// Every core error is a schema/input error (exit code 2); IO and
    /// validation failures carry their own codes on [`LoadError`] and
    /// [`ValidateError`].
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors when loading schema documents from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Errors during instance validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("schema cannot be compiled: {message}")]
    Compile { message: String },

    #[error("validation failed with {} fault(s)", faults.len())]
    Invalid { faults: Vec<ValidationFault> },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Schema(e) => e.exit_code(),
            ValidateError::Compile { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

/// Single validation fault with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationFault {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for ValidationFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_exit_codes() {
        let err = SchemaError::UnsupportedReference {
            pointer: "https://example.com/schema.json".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = SchemaError::UnsupportedComposition {
            path: "/properties/task".into(),
            members: 2,
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("missing.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = serde_json::from_str::<serde_json::Value>("{")
            .map_err(|source| LoadError::InvalidJson { source })
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid {
            faults: vec![ValidationFault {
                path: "/a".into(),
                message: "missing required field".into(),
            }],
        };
        assert_eq!(err.exit_code(), 1);

        let err = ValidateError::Schema(SchemaError::InvalidSchema {
            found: "array".into(),
        });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validation_fault_display() {
        let fault = ValidationFault {
            path: "/properties/name".into(),
            message: "expected string, got number".into(),
        };
        assert_eq!(
            fault.to_string(),
            "/properties/name: expected string, got number"
        );
    }

    #[test]
    fn unsupported_composition_counts_members() {
        let err = SchemaError::UnsupportedComposition {
            path: "/allOf".into(),
            members: 3,
        };
        assert_eq!(
            err.to_string(),
            "unsupported composition at /allOf: cannot merge allOf with 3 member(s)"
        );
    }
}
