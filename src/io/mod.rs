//! Import/Export I/O subsystem.
//!
//! Moves user lists between a store and shareable files.
//!
//! # Architecture
//!
//! - **Schema** describes record fields once; every codec is driven by it
//! - **Format codecs** encode and decode records ([`formats`])
//! - **Validation** checks decoded documents before they become records
//! - **Services** handle files, naming, cleanup and store updates
//!
//! # Supported Formats
//!
//! | Format | Extension | Notes |
//! |--------|-----------|-------|
//! | User list | `.usrl` | JSON array of objects |
//! | CSV | `.ucsv` | Header line, comma-joined, no quoting |
//!
//! CSV import converts rows into the structured document and decodes that,
//! so both formats enforce the same rules.
//!
//! # Examples
//!
//! ```rust,ignore
//! use usershare::io::{ExportService, ImportService, Format};
//!
//! let export = ExportService::new("/tmp/exports").export_store(&store, Format::Csv)?;
//! let import = ImportService::new().import_file(&export.path)?;
//! println!("Imported {} users", import.users.len());
//! ```

pub mod formats;
pub mod schema;
pub mod services;
pub mod validation;

// Re-exports for convenience
pub use formats::{CsvOptions, Format};
pub use schema::{FieldKind, FieldSpec, Schema, USER_SCHEMA};
pub use services::export::{ExportResult, ExportService};
pub use services::import::{ImportResult, ImportService};
pub use validation::{DocumentValidator, ValidationIssue, ValidationResult};
