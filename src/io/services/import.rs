//! User list import service.
//!
//! Decodes a received `.usrl` / `.ucsv` file into users and merges them into
//! a [`UserStore`].

use crate::io::formats::{self, Format};
use crate::io::schema::{Schema, USER_SCHEMA};
use crate::models::User;
use crate::storage::{UpsertSummary, UserStore};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::instrument;

/// Result of decoding an import file.
#[derive(Debug, Clone)]
pub struct ImportResult {
    /// Decoded users, in file order.
    pub users: Vec<User>,
    /// Format detected from the file extension.
    pub format: Format,
    /// The file that was imported.
    pub source: PathBuf,
    /// Whether the source file was deleted afterwards.
    pub source_removed: bool,
}

impl ImportResult {
    /// Number of decoded users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns whether the file held no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Service for importing users from received files.
#[derive(Debug, Clone)]
pub struct ImportService {
    schema: Schema,
    remove_source: bool,
}

impl Default for ImportService {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportService {
    /// Creates an import service that removes source files after reading.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            schema: USER_SCHEMA,
            remove_source: true,
        }
    }

    /// Uses a different record schema.
    #[must_use]
    pub const fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Enables or disables deletion of the source file after an import attempt.
    #[must_use]
    pub const fn with_remove_source(mut self, remove: bool) -> Self {
        self.remove_source = remove;
        self
    }

    /// Decodes users from bytes in a known format.
    ///
    /// # Errors
    ///
    /// Returns the decode error; nothing is returned for a partially valid input.
    pub fn import_bytes(&self, bytes: &[u8], format: Format) -> Result<Vec<User>> {
        formats::decode(format, &self.schema, bytes)
    }

    /// Reads and decodes an import file.
    ///
    /// The format comes from the file extension. Once the file has been read
    /// it is deleted (when removal is enabled) whether or not decoding
    /// succeeds, so a rejected file is not offered again. Files with an
    /// unsupported extension or that cannot be read are left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedFormat`] for an unknown extension
    /// - [`Error::Io`] if the file cannot be read
    /// - the decode error otherwise
    #[instrument(skip(self), fields(operation = "import"))]
    pub fn import_file(&self, path: &Path) -> Result<ImportResult> {
        let start = Instant::now();

        let format = Format::from_path(path).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected import file");
        })?;

        let bytes = fs::read(path).map_err(|e| Error::io("read_import_file", path, &e));
        let decoded = bytes.and_then(|bytes| self.import_bytes(&bytes, format));
        let read_ok = !matches!(decoded, Err(Error::Io { .. }));

        let source_removed = self.remove_source && read_ok && remove_source_file(path);

        record_metrics(
            format,
            start,
            decoded.as_ref().map_or(0, Vec::len),
            decoded.as_ref().err(),
        );

        match decoded {
            Ok(users) => {
                tracing::info!(
                    format = %format,
                    count = users.len(),
                    source_removed,
                    duration_ms = start.elapsed().as_millis(),
                    "Import decoded"
                );
                Ok(ImportResult {
                    users,
                    format,
                    source: path.to_path_buf(),
                    source_removed,
                })
            },
            Err(e) => {
                tracing::warn!(format = %format, error = %e, source_removed, "Import failed");
                Err(e)
            },
        }
    }

    /// Merges users into `store`, replacing existing users with the same id.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the store is left unchanged on failure.
    pub fn apply(&self, store: &mut dyn UserStore, users: &[User]) -> Result<UpsertSummary> {
        let summary = store.upsert_users(users)?;
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Imported users applied"
        );
        Ok(summary)
    }
}

/// Deletes the import source, logging rather than failing on error.
fn remove_source_file(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove import file");
            false
        },
    }
}

#[allow(clippy::cast_precision_loss)]
fn record_metrics(format: Format, start: Instant, count: usize, error: Option<&Error>) {
    let status = error.map_or("success", Error::kind);
    metrics::counter!(
        "usershare_import_total",
        "format" => format.extension(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!("usershare_operation_duration_ms", "operation" => "import")
        .record(start.elapsed().as_secs_f64() * 1000.0);
    if error.is_none() {
        metrics::counter!("usershare_records_total", "direction" => "import")
            .increment(count as u64);
    }
}
