//! # Usershare
//!
//! Export and import a list of user records as shareable files.
//!
//! A point-in-time [`Snapshot`] of every stored [`User`] is written to one of
//! two private file formats:
//!
//! - **User list** (`.usrl`): a JSON array of objects, key-addressed
//! - **CSV** (`.ucsv`): a header line plus one comma-joined line per user
//!
//! Importing goes the other way: the file extension picks the parser, the
//! contents are validated against the record [`Schema`](io::Schema), and the
//! resulting users are handed back to the caller for an explicit upsert into
//! a [`UserStore`](storage::UserStore).
//!
//! ## Example
//!
//! ```rust,ignore
//! use usershare::io::{ExportService, Format, ImportService};
//! use usershare::storage::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let exported = ExportService::new("exports").export_store(&store, Format::Csv)?;
//! let imported = ImportService::new().import_file(&exported.path)?;
//! println!("Round-tripped {} users", imported.users.len());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use std::path::Path;
use thiserror::Error as ThisError;

pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod storage;

pub use config::UsershareConfig;
pub use io::{ExportService, Format, ImportService, Schema, USER_SCHEMA};
pub use models::{Snapshot, User};
pub use storage::{FileStore, MemoryStore, UserStore};

/// Error type for usershare operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `MalformedDocument` | File bytes are not valid JSON, or a CSV file has no header line |
/// | `SchemaMismatch` | A record is missing a field, has a wrong-typed field, or an empty key |
/// | `FieldCoercion` | A CSV cell cannot be coerced to its field's type |
/// | `UnsupportedFormat` | Import path has an unknown or missing extension |
/// | `Io` | Reading, writing, renaming, or deleting a file fails |
/// | `InvalidInput` | Bad CLI or config values, unescapable CSV values in strict mode |
/// | `OperationFailed` | Store or observability operations fail |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The document could not be parsed at all.
    #[error("malformed {format} document: {cause}")]
    MalformedDocument {
        /// Format being decoded.
        format: Format,
        /// Parser message.
        cause: String,
    },

    /// The document parsed, but a record does not match the schema.
    ///
    /// Raised for absent required fields, fields of the wrong type (including
    /// negative or fractional counters), and empty record keys.
    #[error("{format} schema mismatch{}: {reason}", describe_location(.record, .field))]
    SchemaMismatch {
        /// Format being decoded.
        format: Format,
        /// Zero-based record index, when known.
        record: Option<usize>,
        /// Offending field, when known.
        field: Option<String>,
        /// What was wrong.
        reason: String,
    },

    /// A CSV cell could not be coerced to its field type.
    #[error("cannot coerce field '{field}' from '{raw}' (line {line})")]
    FieldCoercion {
        /// Schema field name.
        field: String,
        /// Raw cell text.
        raw: String,
        /// One-based line number in the source file.
        line: usize,
    },

    /// The import path does not carry a recognized extension.
    #[error("unsupported format: {}", describe_extension(.extension))]
    UnsupportedFormat {
        /// The extension found, if any.
        extension: Option<String>,
    },

    /// A filesystem operation failed.
    #[error("{operation} failed for {path}: {cause}")]
    Io {
        /// The operation that failed.
        operation: String,
        /// The path involved.
        path: String,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::Io`] from a `std::io::Error`.
    #[must_use]
    pub fn io(operation: &str, path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            cause: err.to_string(),
        }
    }

    /// Returns a short machine-friendly name for the error kind.
    ///
    /// Used as a metrics label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedDocument { .. } => "malformed_document",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::FieldCoercion { .. } => "field_coercion",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Io { .. } => "io",
            Self::InvalidInput(_) => "invalid_input",
            Self::OperationFailed { .. } => "operation_failed",
        }
    }
}

#[allow(clippy::ref_option)]
fn describe_location(record: &Option<usize>, field: &Option<String>) -> String {
    match (record, field.as_deref()) {
        (Some(r), Some(f)) => format!(" in record {r}, field '{f}'"),
        (Some(r), None) => format!(" in record {r}"),
        (None, Some(f)) => format!(" in field '{f}'"),
        (None, None) => String::new(),
    }
}

#[allow(clippy::ref_option)]
fn describe_extension(extension: &Option<String>) -> String {
    extension
        .as_deref()
        .map_or_else(|| "file has no extension".to_string(), |e| format!(".{e}"))
}

/// Result type alias for usershare operations.
pub type Result<T> = std::result::Result<T, Error>;
