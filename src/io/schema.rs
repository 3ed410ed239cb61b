//! Record schema shared by every format.
//!
//! A [`Schema`] is the ordered list of fields describing the one entity type
//! being exported. The CSV header, the CSV row layout, the structured-format
//! key set, and the text coercion rules all come from here, so adding or
//! reordering a field is a change to the schema constant only.

use crate::{Error, Result};
use serde_json::{Map, Value};

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Free text. Absent values are the empty string.
    Text,
    /// Non-negative integer counter. Absent values are zero.
    Count,
}

impl FieldKind {
    /// Returns the value used when a field is absent from a CSV row.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::Text => Value::String(String::new()),
            Self::Count => Value::from(0_u64),
        }
    }

    /// Returns whether a structured-format value has this kind's type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Count => value.is_u64(),
        }
    }

    /// Coerces CSV cell text to a typed value.
    ///
    /// Absent and empty cells take [`Self::default_value`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldCoercion`] (with `line` 0, filled in by the
    /// caller) if a counter cell is not plain decimal digits fitting a `u64`.
    /// Signs and surrounding whitespace are rejected.
    pub fn coerce(self, field: &str, raw: Option<&str>) -> Result<Value> {
        let Some(text) = raw.filter(|t| !t.is_empty()) else {
            return Ok(self.default_value());
        };

        match self {
            Self::Text => Ok(Value::String(text.to_string())),
            Self::Count => Some(text)
                .filter(|t| t.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|t| t.parse::<u64>().ok())
                .map(Value::from)
                .ok_or_else(|| Error::FieldCoercion {
                    field: field.to_string(),
                    raw: text.to_string(),
                    line: 0,
                }),
        }
    }

    /// Renders a value as CSV cell text.
    ///
    /// Strings pass through, numbers render as decimal digits, and null or
    /// missing values render as empty text.
    #[must_use]
    pub fn stringify(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Count => "non-negative integer",
        }
    }
}

/// One named field of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Serialized field name.
    pub name: &'static str,
    /// Value type.
    pub kind: FieldKind,
    /// Whether the structured format must carry this field.
    pub required: bool,
}

impl FieldSpec {
    /// Creates a required field.
    #[must_use]
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }
}

/// Ordered field list for one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    entity: &'static str,
    key: &'static str,
    fields: &'static [FieldSpec],
}

impl Schema {
    /// Creates a schema.
    ///
    /// `key` must name one of `fields`; it is the field that may not be empty.
    #[must_use]
    pub const fn new(entity: &'static str, key: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            entity,
            key,
            fields,
        }
    }

    /// Entity name, used in file names and logs.
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        self.entity
    }

    /// All fields in canonical order.
    #[must_use]
    pub const fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Field names in canonical order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// The comma-joined CSV header line (without terminator).
    #[must_use]
    pub fn header(&self) -> String {
        self.field_names().join(",")
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name of the key field.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Projects a JSON object onto the schema's key set.
    ///
    /// Keys the schema does not name are dropped; absent fields are skipped.
    #[must_use]
    pub fn project(&self, object: &Map<String, Value>) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|f| object.get(f.name).map(|v| (f.name.to_string(), v.clone())))
            .collect()
    }
}

/// Schema of the exported user record: `[userId, fullName, numCoffees]`.
pub const USER_SCHEMA: Schema = Schema::new(
    "users",
    "userId",
    &[
        FieldSpec::required("userId", FieldKind::Text),
        FieldSpec::required("fullName", FieldKind::Text),
        FieldSpec::required("numCoffees", FieldKind::Count),
    ],
);
