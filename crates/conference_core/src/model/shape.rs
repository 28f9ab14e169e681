//! Structural conformance check for the conference shape.
//!
//! # Responsibility
//! - Decide whether an arbitrary JSON value matches
//!   `{ id?: integer, name?: text, date?: text }`.
//! - Report every mismatched field, not only the first one.
//!
//! # Invariants
//! - Absent and `null` fields always conform.
//! - Unknown extra keys are ignored.
//! - `id` conforms only when representable as `i64`.

use crate::model::conference::Conference;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Primitive kind expected by a shape field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.as_i64().is_some(),
            Self::Text => value.is_string(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Text => "text",
        }
    }
}

const CONFERENCE_FIELDS: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Integer),
    ("name", FieldKind::Text),
    ("date", FieldKind::Text),
];

/// One field whose value does not match its declared kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViolation {
    pub field: &'static str,
    pub expected: FieldKind,
    /// JSON kind actually found, e.g. `string` or `float`.
    pub found: &'static str,
}

impl Display for ShapeViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "field `{}` expected {}, found {}",
            self.field,
            self.expected.as_str(),
            self.found
        )
    }
}

/// Reasons a JSON value does not conform to the conference shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Top-level value is not a JSON object.
    NotAnObject { found: &'static str },
    /// One or more fields carry the wrong primitive kind.
    Fields(Vec<ShapeViolation>),
}

impl ShapeError {
    /// Violations in field order; empty for `NotAnObject`.
    pub fn violations(&self) -> &[ShapeViolation] {
        match self {
            Self::NotAnObject { .. } => &[],
            Self::Fields(violations) => violations,
        }
    }
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject { found } => {
                write!(f, "conference must be a JSON object, found {found}")
            }
            Self::Fields(violations) => {
                let details = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "conference shape mismatch: {details}")
            }
        }
    }
}

impl Error for ShapeError {}

/// Checks `value` against the conference shape.
///
/// # Errors
/// - `NotAnObject` when `value` is not a JSON object.
/// - `Fields` listing every mismatched field.
pub fn check_conference_shape(value: &Value) -> Result<(), ShapeError> {
    let Some(object) = value.as_object() else {
        return Err(ShapeError::NotAnObject {
            found: json_kind(value),
        });
    };

    let violations = CONFERENCE_FIELDS
        .iter()
        .filter_map(|&(field, expected)| match object.get(field) {
            None | Some(Value::Null) => None,
            Some(found) if expected.accepts(found) => None,
            Some(found) => Some(ShapeViolation {
                field,
                expected,
                found: json_kind(found),
            }),
        })
        .collect::<Vec<_>>();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ShapeError::Fields(violations))
    }
}

/// Returns whether `value` conforms to the conference shape.
pub fn conforms(value: &Value) -> bool {
    check_conference_shape(value).is_ok()
}

impl Conference {
    /// Checks `value` against the shape and decodes it.
    pub fn from_json_value(value: &Value) -> Result<Self, ShapeError> {
        check_conference_shape(value)?;
        let object = value.as_object().ok_or(ShapeError::NotAnObject {
            found: json_kind(value),
        })?;

        Ok(Self {
            id: object.get("id").and_then(Value::as_i64),
            name: object
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            date: object
                .get("date")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_i64() => "integer",
        // u64 beyond i64::MAX lands here too.
        Value::Number(number) if number.is_u64() => "unsigned integer out of range",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{check_conference_shape, conforms, FieldKind, ShapeError};
    use crate::model::conference::Conference;
    use serde_json::json;

    #[test]
    fn full_record_conforms() {
        assert!(conforms(
            &json!({ "id": 1, "name": "DevCon", "date": "2024-05-01" })
        ));
    }

    #[test]
    fn all_fields_are_optional() {
        assert!(conforms(&json!({ "name": "DevCon" })));
        assert!(conforms(&json!({})));
        assert!(conforms(&json!({ "id": null, "name": null, "date": null })));
    }

    #[test]
    fn extra_keys_are_ignored() {
        assert!(conforms(&json!({ "id": 4, "venue": "Hall A" })));
    }

    #[test]
    fn string_id_does_not_conform() {
        let err = check_conference_shape(&json!({ "id": "1" })).unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "id");
        assert_eq!(violations[0].expected, FieldKind::Integer);
        assert_eq!(violations[0].found, "string");
    }

    #[test]
    fn float_id_does_not_conform() {
        assert!(!conforms(&json!({ "id": 1.5 })));
    }

    #[test]
    fn every_mismatched_field_is_reported() {
        let err = check_conference_shape(&json!({ "id": true, "name": 5, "date": ["x"] }))
            .unwrap_err();
        let fields = err
            .violations()
            .iter()
            .map(|violation| violation.field)
            .collect::<Vec<_>>();
        assert_eq!(fields, vec!["id", "name", "date"]);
        assert!(err.to_string().contains("field `name` expected text, found integer"));
    }

    #[test]
    fn non_object_values_do_not_conform() {
        let err = check_conference_shape(&json!([1, 2])).unwrap_err();
        assert_eq!(err, ShapeError::NotAnObject { found: "array" });
        assert!(err.violations().is_empty());
    }

    #[test]
    fn from_json_value_decodes_conforming_values() {
        let conference =
            Conference::from_json_value(&json!({ "name": "DevCon", "extra": 1 })).unwrap();
        assert_eq!(
            conference,
            Conference {
                id: None,
                name: Some("DevCon".to_string()),
                date: None,
            }
        );

        assert!(Conference::from_json_value(&json!({ "date": 20240501 })).is_err());
    }
}
