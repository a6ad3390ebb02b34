//! Content-derived schema identifiers.
//!
//! `schema_id` fingerprints the entire document; `schema_data_id` first
//! strips the human-authoring layer (descriptions, defaults, vendor `X-`
//! extensions) so prompt and documentation edits leave the identifier alone
//! while structural edits change it.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::canonical::canonicalize;
use crate::error::SchemaError;
use crate::types::{json_type_name, AUTHORING_FIELDS, EXTENSION_PREFIX};

/// Prefix for whole-document identifiers.
pub const SCHEMA_ID_PREFIX: &str = "sch_id_";

/// Prefix for data-shape identifiers.
pub const SCHEMA_DATA_ID_PREFIX: &str = "sch_data_id_";

const DIGEST_BYTES: usize = 8;

/// Identifier for the full document, authoring fields included.
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` if `doc` is not an object.
pub fn schema_id(doc: &Value) -> Result<String, SchemaError> {
    require_object(doc)?;
    let digest = short_digest(canonicalize(doc).as_bytes());
    Ok(format!("{}{}", SCHEMA_ID_PREFIX, digest))
}

/// Identifier for the data shape only.
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` if `doc` is not an object.
pub fn schema_data_id(doc: &Value) -> Result<String, SchemaError> {
    require_object(doc)?;
    let cleaned = strip_authoring_fields(doc);
    let digest = short_digest(canonicalize(&cleaned).as_bytes());
    Ok(format!("{}{}", SCHEMA_DATA_ID_PREFIX, digest))
}

/// 16-hex-character fingerprint: SHA-256 truncated to its first 8 bytes.
pub fn short_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..DIGEST_BYTES])
}

/// Strip authoring fields and vendor extension keys, recursively.
///
/// Removes every key in [`AUTHORING_FIELDS`] and every key prefixed `X-` at
/// any depth, including inside array elements.
pub fn strip_authoring_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut result = Map::new();
            for (k, v) in map {
                if AUTHORING_FIELDS.contains(&k.as_str()) || k.starts_with(EXTENSION_PREFIX) {
                    continue;
                }
                result.insert(k.clone(), strip_authoring_fields(v));
            }
            Value::Object(result)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(strip_authoring_fields).collect()),
        other => other.clone(),
    }
}

fn require_object(doc: &Value) -> Result<(), SchemaError> {
    if doc.is_object() {
        Ok(())
    } else {
        Err(SchemaError::InvalidSchema {
            found: json_type_name(doc).to_string(),
        })
    }
}
