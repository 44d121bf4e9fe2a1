//! Generic argument validation driven by the operation table.

use std::fmt;

use serde_json::{Map, Value};

use super::catalog::{FieldKind, OperationKind, OperationSpec};
use crate::domains::upstream::query_scalar;

/// Arguments that passed validation, split for descriptor construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    /// Value for the path identifier, when the operation has one.
    pub id: Option<Value>,
    /// Remaining non-null arguments, in caller order.
    pub params: Map<String, Value>,
}

/// Every violation found in one argument set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.violations.join("; "))
    }
}

impl std::error::Error for ValidationError {}

fn present<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|value| !value.is_null())
}

/// Check `args` against `operation` and split out the path identifier.
///
/// All violations are collected rather than stopping at the first one.
/// Arguments the operation does not declare are passed through, as long as
/// they can travel where the operation sends its arguments.
pub fn validate(
    operation: &OperationSpec,
    args: &Map<String, Value>,
) -> Result<ValidatedArgs, ValidationError> {
    let mut violations = Vec::new();

    for field in operation.fields {
        let Some(value) = present(args, field.name) else {
            if field.required {
                violations.push(format!("missing required field '{}'", field.name));
            }
            continue;
        };

        if !field.kind.matches(value) {
            violations.push(format!("'{}' must be {}", field.name, field.kind.expected()));
        } else if field.required
            && field.kind == FieldKind::Text
            && value.as_str().is_some_and(|s| s.trim().is_empty())
        {
            violations.push(format!("'{}' must not be empty", field.name));
        }
    }

    if !operation.at_least_one_of.is_empty()
        && !operation
            .at_least_one_of
            .iter()
            .any(|name| present(args, name).is_some())
    {
        let names: Vec<_> = operation
            .at_least_one_of
            .iter()
            .map(|name| format!("'{name}'"))
            .collect();
        violations.push(format!("at least one of {} is required", names.join(", ")));
    }

    if !operation.args_in_body() {
        for (name, value) in args {
            if operation.field(name).is_none() && !value.is_null() && query_scalar(value).is_none()
            {
                violations.push(format!("'{name}' must be a scalar value"));
            }
        }
    }

    if operation.kind == OperationKind::Update {
        let has_change = args
            .iter()
            .any(|(name, value)| Some(name.as_str()) != operation.id_field && !value.is_null());
        if !has_change {
            violations.push("nothing to update".to_string());
        }
    }

    if !violations.is_empty() {
        return Err(ValidationError { violations });
    }

    let id = operation
        .id_field
        .and_then(|field| present(args, field))
        .cloned();
    let params = args
        .iter()
        .filter(|(name, value)| Some(name.as_str()) != operation.id_field && !value.is_null())
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Ok(ValidatedArgs { id, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::operations::catalog::catalog;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn op(name: &str) -> &'static OperationSpec {
        catalog().resolve(name).unwrap()
    }

    #[test]
    fn test_create_deal_valid() {
        let validated = validate(
            op("create_deal"),
            &args(json!({"title": "X", "pipeline_id": 1, "stage_id": 2, "owner_id": 3})),
        )
        .unwrap();
        assert_eq!(validated.id, None);
        assert_eq!(validated.params.len(), 4);
        assert_eq!(validated.params["title"], "X");
    }

    #[test]
    fn test_validation_is_idempotent() {
        let input = args(json!({"title": "X", "pipeline_id": 1, "stage_id": 2, "owner_id": 3}));
        let first = validate(op("create_deal"), &input).unwrap();
        let again = validate(op("create_deal"), &first.params).unwrap();
        assert_eq!(first.params, again.params);
        assert_eq!(input["title"], "X");
    }

    #[test]
    fn test_each_required_field_is_needed() {
        let complete = args(json!({"title": "X", "pipeline_id": 1, "stage_id": 2, "owner_id": 3}));
        for name in op("create_deal").required_fields() {
            let mut partial = complete.clone();
            partial.remove(name);
            let err = validate(op("create_deal"), &partial).unwrap_err();
            assert!(err.to_string().contains(name));
        }
    }

    #[test]
    fn test_missing_required_fields_all_reported() {
        let err = validate(op("create_deal"), &args(json!({"title": "X"}))).unwrap_err();
        assert_eq!(err.violations.len(), 3);
        assert!(err.to_string().contains("'pipeline_id'"));
        assert!(err.to_string().contains("'stage_id'"));
        assert!(err.to_string().contains("'owner_id'"));
    }

    #[test]
    fn test_type_mismatch() {
        let err = validate(
            op("create_deal"),
            &args(json!({"title": 5, "pipeline_id": "one", "stage_id": 2, "owner_id": 3})),
        )
        .unwrap_err();
        assert_eq!(
            err.violations,
            vec!["'title' must be a string", "'pipeline_id' must be a number"]
        );
    }

    #[test]
    fn test_blank_required_text_rejected() {
        let err = validate(op("create_company"), &args(json!({"name": "  ", "owner_id": 1})))
            .unwrap_err();
        assert_eq!(err.violations, vec!["'name' must not be empty"]);
    }

    #[test]
    fn test_null_counts_as_absent() {
        let err = validate(op("get_deal"), &args(json!({"deal_id": null}))).unwrap_err();
        assert_eq!(err.violations, vec!["missing required field 'deal_id'"]);

        let validated = validate(op("list_deals"), &args(json!({"status": null}))).unwrap();
        assert!(validated.params.is_empty());
    }

    #[test]
    fn test_identifier_split_out() {
        let validated = validate(
            op("update_deal"),
            &args(json!({"deal_id": 42, "title": "Renamed"})),
        )
        .unwrap();
        assert_eq!(validated.id, Some(json!(42)));
        assert_eq!(validated.params, args(json!({"title": "Renamed"})));
    }

    #[test]
    fn test_update_requires_a_change() {
        let err = validate(op("update_person"), &args(json!({"person_id": 7}))).unwrap_err();
        assert_eq!(err.violations, vec!["nothing to update"]);
    }

    #[test]
    fn test_note_requires_an_owner_entity() {
        let err = validate(op("create_note"), &args(json!({"content": "hi"}))).unwrap_err();
        assert_eq!(
            err.violations,
            vec!["at least one of 'deal_id', 'person_id', 'company_id' is required"]
        );
        let attached = args(json!({"content": "hi", "company_id": 3}));
        assert!(validate(op("create_note"), &attached).is_ok());
    }

    #[test]
    fn test_undeclared_arguments_pass_through() {
        let validated = validate(op("list_deals"), &args(json!({"custom_filter": "x"}))).unwrap();
        assert_eq!(validated.params["custom_filter"], "x");

        let validated = validate(
            op("create_person"),
            &args(json!({"name": "Ana", "owner_id": 1, "extra": {"nested": true}})),
        )
        .unwrap();
        assert_eq!(validated.params["extra"], json!({"nested": true}));
    }

    #[test]
    fn test_structured_query_argument_rejected() {
        let err = validate(op("list_deals"), &args(json!({"filter": [1, 2]}))).unwrap_err();
        assert_eq!(err.violations, vec!["'filter' must be a scalar value"]);
    }

    #[test]
    fn test_integer_field_accepts_any_number() {
        assert!(validate(op("get_deal"), &args(json!({"deal_id": 5.0}))).is_ok());
    }
}
