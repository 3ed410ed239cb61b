//! Format codecs for import/export.
//!
//! The file extension is the only thing that tells the formats apart: there
//! is no marker inside the file content.

pub mod csv;
pub mod json;

use crate::io::schema::Schema;
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::str::FromStr;

pub use self::csv::CsvOptions;

/// Supported file formats for import/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Structured user list: a JSON array of objects.
    UserList,
    /// Header-driven, comma-joined CSV without quoting.
    Csv,
}

impl Format {
    /// Returns all formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::UserList, Self::Csv]
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::UserList => "usrl",
            Self::Csv => "ucsv",
        }
    }

    /// Returns the MIME type of the content.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::UserList => "application/json",
            Self::Csv => "text/csv",
        }
    }

    /// Detects format from file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the extension is missing or
    /// not one of `usrl` / `ucsv`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match ext.as_deref() {
            Some("usrl") => Ok(Self::UserList),
            Some("ucsv") => Ok(Self::Csv),
            other => Err(Error::UnsupportedFormat {
                extension: other.map(String::from),
            }),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "usrl" | "userlist" | "user-list" | "json" => Ok(Self::UserList),
            "ucsv" | "csv" => Ok(Self::Csv),
            _ => Err(Error::InvalidInput(format!("Unknown format: {s}"))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encodes records in the given format.
///
/// # Errors
///
/// Returns an error if serialization fails, or if `options` reject a CSV
/// value that cannot be written without escaping.
pub fn encode<T: Serialize>(
    format: Format,
    schema: &Schema,
    records: &[T],
    options: &CsvOptions,
) -> Result<Vec<u8>> {
    match format {
        Format::UserList => json::encode_structured(schema, records),
        Format::Csv => csv::encode_csv(schema, records, options).map(String::into_bytes),
    }
}

/// Decodes records in the given format.
///
/// # Errors
///
/// Returns the format's parse error; the whole input is rejected on the
/// first bad record.
pub fn decode<T: DeserializeOwned>(format: Format, schema: &Schema, bytes: &[u8]) -> Result<Vec<T>> {
    match format {
        Format::UserList => json::decode_structured(schema, bytes),
        Format::Csv => csv::decode_csv(schema, bytes),
    }
}
