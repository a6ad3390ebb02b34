//! Instance validation against schemas.

use serde_json::Value;

use crate::error::{ValidateError, ValidationFault};

/// Validate an instance against a schema.
///
/// Compiles the schema and collects every fault rather than stopping at the
/// first, so callers can report them all at once.
///
/// # Errors
///
/// Returns `ValidateError::Compile` if the schema cannot be compiled, or
/// `ValidateError::Invalid` with the collected faults if the instance does
/// not match.
pub fn validate_instance(schema: &Value, instance: &Value) -> Result<(), ValidateError> {
    let validator =
        jsonschema::validator_for(schema).map_err(|e| ValidateError::Compile {
            message: e.to_string(),
        })?;

    let faults: Vec<ValidationFault> = validator
        .iter_errors(instance)
        .map(|e| ValidationFault {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if faults.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { faults })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_instance_passes() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            },
            "required": ["name"]
        });

        let result = validate_instance(&schema, &json!({"name": "test"}));
        assert!(result.is_ok());
    }

    #[test]
    fn missing_required_field_fails() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            },
            "required": ["name"]
        });

        let result = validate_instance(&schema, &json!({}));
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }

    #[test]
    fn wrong_type_fails() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            }
        });

        let result = validate_instance(&schema, &json!({"name": 123}));
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }

    #[test]
    fn collects_multiple_faults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "number" }
            },
            "required": ["name", "age"]
        });

        let result = validate_instance(&schema, &json!({}));
        match result {
            Err(ValidateError::Invalid { faults }) => {
                assert_eq!(faults.len(), 2);
            }
            _ => panic!("expected validation error with 2 faults"),
        }
    }

    #[test]
    fn enum_membership_is_enforced() {
        let schema = json!({"type": "string", "enum": ["x", "y"]});

        assert!(validate_instance(&schema, &json!("x")).is_ok());
        assert!(matches!(
            validate_instance(&schema, &json!("z")),
            Err(ValidateError::Invalid { .. })
        ));
    }

    #[test]
    fn local_refs_resolve_during_validation() {
        let schema = json!({
            "$defs": {"Name": {"type": "string"}},
            "type": "object",
            "properties": {"name": {"$ref": "#/$defs/Name"}}
        });

        assert!(validate_instance(&schema, &json!({"name": "ok"})).is_ok());
        assert!(validate_instance(&schema, &json!({"name": 1})).is_err());
    }
}
