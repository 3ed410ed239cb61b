//! Structured document validation.
//!
//! Checks a parsed document against a [`Schema`] before it is turned into
//! typed records. Every import, CSV included, passes through here.

use super::formats::Format;
use super::schema::Schema;
use crate::{Error, Result};
use serde_json::Value;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Warning: issue noted but import can proceed.
    Warning,
    /// Error: the document is rejected.
    Error,
}

/// A validation issue found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Zero-based record index, `None` for document-level issues.
    pub record: Option<usize>,
    /// The field that has an issue.
    pub field: Option<String>,
    /// Description of the issue.
    pub message: String,
    /// Severity of the issue.
    pub severity: ValidationSeverity,
}

impl ValidationIssue {
    /// Creates a warning issue.
    #[must_use]
    pub fn warning(record: Option<usize>, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            record,
            field: field.map(String::from),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        }
    }

    /// Creates an error issue.
    #[must_use]
    pub fn error(record: Option<usize>, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            record,
            field: field.map(String::from),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }

    /// Returns whether this issue rejects the document.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == ValidationSeverity::Error
    }
}

/// Result of validating a document.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Number of records inspected.
    pub records: usize,
    /// Issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Whether the document can be decoded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }

    /// Error-severity issues, in document order.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    /// Warning-severity issues, in document order.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// Converts the result into an error if any issue is an error.
    ///
    /// The first error is reported; the total count is appended when there
    /// is more than one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if the document is invalid.
    pub fn into_result(self, format: Format) -> Result<()> {
        let total = self.errors().count();
        let Some(first) = self.issues.into_iter().find(ValidationIssue::is_error) else {
            return Ok(());
        };

        let reason = if total > 1 {
            format!("{} ({} problems in total)", first.message, total)
        } else {
            first.message
        };

        Err(Error::SchemaMismatch {
            format,
            record: first.record,
            field: first.field,
            reason,
        })
    }
}

/// Validates structured documents against a schema.
pub struct DocumentValidator<'a> {
    schema: &'a Schema,
}

impl<'a> DocumentValidator<'a> {
    /// Creates a validator for `schema`.
    #[must_use]
    pub const fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validates a whole document: an array of objects.
    #[must_use]
    pub fn validate(&self, document: &Value) -> ValidationResult {
        let Some(records) = document.as_array() else {
            return ValidationResult {
                records: 0,
                issues: vec![ValidationIssue::error(
                    None,
                    None,
                    format!("expected an array of records, found {}", json_type(document)),
                )],
            };
        };

        let mut result = ValidationResult {
            records: records.len(),
            issues: Vec::new(),
        };
        for (index, record) in records.iter().enumerate() {
            self.validate_record(index, record, &mut result.issues);
        }
        result
    }

    fn validate_record(&self, index: usize, record: &Value, issues: &mut Vec<ValidationIssue>) {
        let Some(object) = record.as_object() else {
            issues.push(ValidationIssue::error(
                Some(index),
                None,
                format!("expected an object, found {}", json_type(record)),
            ));
            return;
        };

        for spec in self.schema.fields() {
            match object.get(spec.name) {
                None if spec.required => issues.push(ValidationIssue::error(
                    Some(index),
                    Some(spec.name),
                    "missing required field",
                )),
                None => {},
                Some(value) if !spec.kind.accepts(value) => {
                    issues.push(ValidationIssue::error(
                        Some(index),
                        Some(spec.name),
                        format!("expected {}, found {}", spec.kind.as_str(), describe(value)),
                    ));
                },
                Some(value) if spec.name == self.schema.key() && value.as_str() == Some("") => {
                    issues.push(ValidationIssue::error(
                        Some(index),
                        Some(spec.name),
                        "key field must not be empty",
                    ));
                },
                Some(_) => {},
            }
        }

        for key in object.keys() {
            if self.schema.field(key).is_none() {
                issues.push(ValidationIssue::warning(
                    Some(index),
                    Some(key),
                    "unknown field ignored",
                ));
            }
        }
    }
}

/// Validates `document` and logs its warnings.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] for the first error-severity issue.
pub fn validate_document(schema: &Schema, format: Format, document: &Value) -> Result<()> {
    let result = DocumentValidator::new(schema).validate(document);
    for warning in result.warnings() {
        tracing::warn!(
            format = %format,
            record = ?warning.record,
            field = ?warning.field,
            "{}",
            warning.message
        );
    }
    result.into_result(format)
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("number {n}"),
        other => json_type(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::schema::USER_SCHEMA;
    use serde_json::json;

    fn validate(document: &Value) -> ValidationResult {
        DocumentValidator::new(&USER_SCHEMA).validate(document)
    }

    #[test]
    fn test_valid_document() {
        let result = validate(&json!([
            {"userId": "u1", "fullName": "Ann", "numCoffees": 3},
            {"userId": "u2", "fullName": "", "numCoffees": 0}
        ]));
        assert!(result.is_valid());
        assert_eq!(result.records, 2);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(validate(&json!([])).is_valid());
    }

    #[test]
    fn test_not_an_array() {
        let result = validate(&json!({"userId": "u1"}));
        assert!(!result.is_valid());
        assert_eq!(result.issues[0].record, None);
    }

    #[test]
    fn test_missing_field() {
        let result = validate(&json!([{"userId": "u1", "numCoffees": 3}]));
        let error = result.errors().next().unwrap();
        assert_eq!(error.record, Some(0));
        assert_eq!(error.field.as_deref(), Some("fullName"));
    }

    #[test]
    fn test_wrong_types() {
        let result = validate(&json!([
            {"userId": "u1", "fullName": "Ann", "numCoffees": "3"},
            {"userId": "u2", "fullName": null, "numCoffees": -1}
        ]));
        assert_eq!(result.errors().count(), 3);
    }

    #[test]
    fn test_empty_key() {
        let result = validate(&json!([{"userId": "", "fullName": "Ann", "numCoffees": 1}]));
        let error = result.errors().next().unwrap();
        assert_eq!(error.field.as_deref(), Some("userId"));
        assert!(error.message.contains("empty"));
    }

    #[test]
    fn test_unknown_field_is_warning() {
        let result = validate(&json!([
            {"userId": "u1", "fullName": "Ann", "numCoffees": 1, "email": "a@b.c"}
        ]));
        assert!(result.is_valid());
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn test_into_result_reports_first_error() {
        let result = validate(&json!([
            {"userId": "u1", "fullName": "Ann", "numCoffees": 1},
            {"userId": "u2"}
        ]));
        let err = result.into_result(Format::UserList).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaMismatch { record: Some(1), ref field, ref reason, .. }
                if field.as_deref() == Some("fullName") && reason.contains("2 problems")
        ));
    }
}
