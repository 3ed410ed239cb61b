//! Structured user-list format (`.usrl`).
//!
//! A single JSON array of objects, one object per record, keyed by the
//! schema's field names. Decoding is all-or-nothing.

use super::Format;
use crate::io::schema::Schema;
use crate::io::validation::validate_document;
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use serde_json::error::Category;

/// Encodes records as a compact JSON array.
///
/// Each record is projected onto the schema, so the key set of every object
/// is exactly the schema's field set.
///
/// # Errors
///
/// Returns an error if a record does not serialize to a JSON object.
pub fn encode_structured<T: Serialize>(schema: &Schema, records: &[T]) -> Result<Vec<u8>> {
    let objects = to_objects(schema, records)?;
    let document = Value::Array(objects.into_iter().map(Value::Object).collect());
    serde_json::to_vec(&document).map_err(|e| Error::OperationFailed {
        operation: "encode_usrl".to_string(),
        cause: e.to_string(),
    })
}

/// Decodes a JSON array of records.
///
/// # Errors
///
/// - [`Error::MalformedDocument`] if the bytes are not JSON
/// - [`Error::SchemaMismatch`] if the JSON does not match the schema
pub fn decode_structured<T: DeserializeOwned>(schema: &Schema, bytes: &[u8]) -> Result<Vec<T>> {
    decode_as(schema, Format::UserList, bytes)
}

/// Decodes structured bytes, reporting errors under `format`.
///
/// CSV imports route their canonical document through here so both formats
/// share one set of validation rules.
pub(crate) fn decode_as<T: DeserializeOwned>(
    schema: &Schema,
    format: Format,
    bytes: &[u8],
) -> Result<Vec<T>> {
    let document: Value = serde_json::from_slice(bytes).map_err(|e| match e.classify() {
        Category::Data => Error::SchemaMismatch {
            format,
            record: None,
            field: None,
            reason: e.to_string(),
        },
        Category::Io | Category::Syntax | Category::Eof => Error::MalformedDocument {
            format,
            cause: e.to_string(),
        },
    })?;

    validate_document(schema, format, &document)?;

    serde_json::from_value(document).map_err(|e| Error::SchemaMismatch {
        format,
        record: None,
        field: None,
        reason: e.to_string(),
    })
}

/// Serializes records into schema-projected JSON objects.
pub(crate) fn to_objects<T: Serialize>(
    schema: &Schema,
    records: &[T],
) -> Result<Vec<Map<String, Value>>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let value = serde_json::to_value(record).map_err(|e| Error::OperationFailed {
                operation: "serialize_record".to_string(),
                cause: e.to_string(),
            })?;
            let Value::Object(object) = value else {
                return Err(Error::InvalidInput(format!(
                    "record {index} of '{}' does not serialize to an object",
                    schema.entity()
                )));
            };
            Ok(schema.project(&object))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::schema::USER_SCHEMA;
    use crate::models::User;

    fn users() -> Vec<User> {
        vec![
            User::new("u1").with_display_name("Ann").with_visit_count(3),
            User::new("u2"),
        ]
    }

    #[test]
    fn test_encode_structured() {
        let bytes = encode_structured(&USER_SCHEMA, &users()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["userId"], "u1");
        assert_eq!(array[0]["fullName"], "Ann");
        assert_eq!(array[0]["numCoffees"], 3);
        assert_eq!(array[1]["fullName"], "");
    }

    #[test]
    fn test_empty_snapshot_is_empty_array() {
        let bytes = encode_structured::<User>(&USER_SCHEMA, &[]).unwrap();
        assert_eq!(bytes, b"[]");

        let decoded: Vec<User> = decode_structured(&USER_SCHEMA, &bytes).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let original = users();
        let bytes = encode_structured(&USER_SCHEMA, &original).unwrap();
        let decoded: Vec<User> = decode_structured(&USER_SCHEMA, &bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_key_order_irrelevant() {
        let input = br#"[{"numCoffees": 5, "userId": "z", "fullName": "Zed"}]"#;
        let decoded: Vec<User> = decode_structured(&USER_SCHEMA, input).unwrap();
        assert_eq!(
            decoded,
            vec![User::new("z").with_display_name("Zed").with_visit_count(5)]
        );
    }

    #[test]
    fn test_decode_malformed() {
        let inputs: [&[u8]; 3] = [b"not json", br#"[{"userId": "u1""#, b""];
        for input in inputs {
            let err = decode_structured::<User>(&USER_SCHEMA, input).unwrap_err();
            assert!(
                matches!(err, Error::MalformedDocument { format: Format::UserList, .. }),
                "unexpected error: {err}"
            );
        }
    }

    #[test]
    fn test_decode_schema_mismatch() {
        let inputs: [&[u8]; 4] = [
            br#"[{"userId": "u1", "fullName": "Ann"}]"#,
            br#"[{"userId": "u1", "fullName": "Ann", "numCoffees": "three"}]"#,
            br#"[{"userId": "u1", "fullName": "Ann", "numCoffees": -2}]"#,
            br#"{"users": []}"#,
        ];
        for input in inputs {
            let err = decode_structured::<User>(&USER_SCHEMA, input).unwrap_err();
            assert!(
                matches!(err, Error::SchemaMismatch { format: Format::UserList, .. }),
                "unexpected error: {err}"
            );
        }
    }

    #[test]
    fn test_decode_is_atomic() {
        let input = br#"[
            {"userId": "u1", "fullName": "Ann", "numCoffees": 1},
            {"userId": "u2", "fullName": 7, "numCoffees": 1}
        ]"#;
        assert!(decode_structured::<User>(&USER_SCHEMA, input).is_err());
    }

    #[test]
    fn test_decode_as_reports_context() {
        let err = decode_as::<User>(&USER_SCHEMA, Format::Csv, b"[{}]").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { format: Format::Csv, .. }));
    }
}
