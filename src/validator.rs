//! Payload validation against schemas of a bundled document.

use serde_json::{json, Value};

use crate::error::{SchemaError, SpecError, ValidateError};

/// Validate a payload against `#/components/schemas/<component>` of a bundle.
///
/// The bundle's `components` travel with the schema, so internal references
/// between components resolve.
///
/// # Errors
///
/// `ValidateError::Spec` when the component does not exist or the bundle is
/// not a usable JSON Schema, `ValidateError::Invalid` with every violation
/// when the payload does not match.
pub fn validate_payload(
    bundle: &Value,
    component: &str,
    payload: &Value,
) -> Result<(), ValidateError> {
    let pointer = format!("#/components/schemas/{}", component);
    if bundle
        .pointer(&format!("/components/schemas/{}", escape(component)))
        .is_none()
    {
        return Err(SpecError::UnresolvedReference { name: pointer }.into());
    }
    let schema = json!({
        "$ref": pointer.as_str(),
        "components": bundle.get("components").cloned().unwrap_or(Value::Null),
    });
    validate_against_schema(&schema, payload).map_err(|err| match err {
        ValidateError::Spec(SpecError::InvalidDocument { message, .. }) => {
            SpecError::InvalidDocument {
                path: pointer.clone(),
                message,
            }
            .into()
        }
        other => other,
    })
}

/// Validate a payload against a standalone JSON Schema.
///
/// Use this when you've already extracted the schema and want to validate
/// multiple payloads against it.
///
/// # Errors
///
/// `ValidateError::Spec` if the schema itself is invalid,
/// `ValidateError::Invalid` if the payload doesn't match.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| SpecError::InvalidDocument {
        path: "schema".to_string(),
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> Value {
        json!({
            "openapi": "3.1.0",
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "required": ["email", "address"],
                        "properties": {
                            "email": { "type": "string" },
                            "age": { "type": "integer" },
                            "address": { "$ref": "#/components/schemas/Address" }
                        }
                    },
                    "Address": {
                        "type": "object",
                        "required": ["line"],
                        "properties": { "line": { "type": "string" } }
                    }
                }
            }
        })
    }

    #[test]
    fn validate_valid_payload() {
        let payload = json!({ "email": "a@b.c", "address": { "line": "1 Main St" } });
        assert!(validate_payload(&bundle(), "User", &payload).is_ok());
    }

    #[test]
    fn validate_follows_component_refs() {
        let payload = json!({ "email": "a@b.c", "address": { "line": 7 } });
        match validate_payload(&bundle(), "User", &payload) {
            Err(ValidateError::Invalid { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "/address/line");
            }
            other => panic!("expected one validation error, got {:?}", other),
        }
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let payload = json!({ "age": "old" });
        match validate_payload(&bundle(), "User", &payload) {
            Err(ValidateError::Invalid { errors }) => {
                // two missing required fields, one wrong type
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.path == "/age"));
            }
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn unknown_component_is_spec_error() {
        let err = validate_payload(&bundle(), "Ghost", &json!({})).unwrap_err();
        assert!(matches!(
            err,
            ValidateError::Spec(SpecError::UnresolvedReference { .. })
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_wrong_type_against_plain_schema() {
        let schema = json!({
            "type": "object",
            "properties": { "name": { "type": "string" } }
        });
        let result = validate_against_schema(&schema, &json!({ "name": 123 }));
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }
}
