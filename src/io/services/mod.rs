//! Import and export services.
//!
//! Tie the format codecs to files on disk and to a [`crate::UserStore`].

pub mod export;
pub mod import;

pub use export::{ExportResult, ExportService, export_file_stem};
pub use import::{ImportResult, ImportService};
