//! User list export service.
//!
//! Writes a [`Snapshot`] to a timestamped file that the caller can hand to a
//! share mechanism.

use crate::io::formats::{self, CsvOptions, Format};
use crate::io::schema::{Schema, USER_SCHEMA};
use crate::models::Snapshot;
use crate::storage::UserStore;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::instrument;

/// `strftime` pattern for the timestamp in export file names.
///
/// Minute resolution; collisions within one minute get a numeric suffix.
const FILE_TIMESTAMP_FORMAT: &str = "%B-%d-%Y-%H-%M";

/// Result of an export operation.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Path of the written file.
    pub path: PathBuf,
    /// Number of users exported.
    pub exported: usize,
    /// Format used for export.
    pub format: Format,
    /// Size of the written file in bytes.
    pub bytes: usize,
}

impl ExportResult {
    /// Returns whether any users were exported.
    #[must_use]
    pub const fn has_exports(&self) -> bool {
        self.exported > 0
    }
}

/// Service for exporting users to shareable files.
#[derive(Debug, Clone)]
pub struct ExportService {
    schema: Schema,
    export_dir: PathBuf,
    csv: CsvOptions,
}

impl ExportService {
    /// Creates an export service writing into `export_dir`.
    #[must_use]
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema: USER_SCHEMA,
            export_dir: export_dir.into(),
            csv: CsvOptions::default(),
        }
    }

    /// Uses a different record schema.
    #[must_use]
    pub const fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the CSV export options.
    #[must_use]
    pub const fn with_csv_options(mut self, options: CsvOptions) -> Self {
        self.csv = options;
        self
    }

    /// Directory export files are written to.
    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Encodes a snapshot in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self, snapshot: &Snapshot, format: Format) -> Result<Vec<u8>> {
        formats::encode(format, &self.schema, snapshot.users(), &self.csv)
    }

    /// Takes a snapshot of `store` and exports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the export fails.
    pub fn export_store(&self, store: &dyn UserStore, format: Format) -> Result<ExportResult> {
        let snapshot = Snapshot::capture(store)?;
        self.export_snapshot(&snapshot, format)
    }

    /// Writes a snapshot to a new file in the export directory.
    ///
    /// The file is named after the snapshot's timestamp and written through
    /// a temporary file, so a partially written export never appears under
    /// the final name.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the file cannot be written.
    #[instrument(skip_all, fields(operation = "export", format = %format, users = snapshot.len()))]
    pub fn export_snapshot(&self, snapshot: &Snapshot, format: Format) -> Result<ExportResult> {
        let start = Instant::now();

        let result = self.write_snapshot(snapshot, format);
        record_metrics(format, start, snapshot.len(), result.as_ref().err());

        match &result {
            Ok(export) => tracing::info!(
                path = %export.path.display(),
                exported = export.exported,
                bytes = export.bytes,
                duration_ms = start.elapsed().as_millis(),
                "Export completed"
            ),
            Err(e) => tracing::warn!(error = %e, "Export failed"),
        }
        result
    }

    fn write_snapshot(&self, snapshot: &Snapshot, format: Format) -> Result<ExportResult> {
        let content = self.encode(snapshot, format)?;

        fs::create_dir_all(&self.export_dir)
            .map_err(|e| Error::io("create_export_dir", &self.export_dir, &e))?;

        let stem = export_file_stem(&self.schema, snapshot.timestamp());
        let path = unique_path(&self.export_dir, &stem, format.extension());
        write_atomic(&path, &content)?;

        Ok(ExportResult {
            path,
            exported: snapshot.len(),
            format,
            bytes: content.len(),
        })
    }
}

/// Builds the export file stem, e.g. `exported_users_June-26-2020-15-04`.
#[must_use]
pub fn export_file_stem(schema: &Schema, at: DateTime<Local>) -> String {
    format!(
        "exported_{}_{}",
        schema.entity(),
        at.format(FILE_TIMESTAMP_FORMAT)
    )
}

/// Returns `dir/stem.ext`, or `dir/stem-N.ext` for the first free `N >= 2`.
///
/// The check is not atomic with the later rename in [`write_atomic`], and a
/// rename replaces an existing file. Two processes exporting into the same
/// directory within the same minute can pick the same name, and the later
/// export then overwrites the earlier one.
fn unique_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{stem}.{extension}"));
    let mut suffix = 2_u32;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}-{suffix}.{extension}"));
        suffix += 1;
    }
    candidate
}

/// Writes `content` to a sibling temp file, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = write_synced(&tmp, content) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io("write_file", path, &e));
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Error::io("rename_file", path, &e)
    })
}

fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(content)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

#[allow(clippy::cast_precision_loss)]
fn record_metrics(format: Format, start: Instant, count: usize, error: Option<&Error>) {
    let status = error.map_or("success", Error::kind);
    metrics::counter!(
        "usershare_export_total",
        "format" => format.extension(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!("usershare_operation_duration_ms", "operation" => "export")
        .record(start.elapsed().as_secs_f64() * 1000.0);
    if error.is_none() {
        metrics::counter!("usershare_records_total", "direction" => "export")
            .increment(count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2020, 6, 26, 15, 4, 0).unwrap()
    }

    fn snapshot() -> Snapshot {
        Snapshot::taken_at(
            vec![User::new("u1").with_display_name("Ann").with_visit_count(3)],
            fixed_time(),
        )
    }

    #[test]
    fn test_export_file_stem() {
        assert_eq!(
            export_file_stem(&USER_SCHEMA, fixed_time()),
            "exported_users_June-26-2020-15-04"
        );
    }

    #[test]
    fn test_export_csv_file() {
        let dir = TempDir::new().unwrap();
        let service = ExportService::new(dir.path());

        let result = service.export_snapshot(&snapshot(), Format::Csv).unwrap();

        assert_eq!(result.exported, 1);
        assert!(result.has_exports());
        assert_eq!(
            result.path,
            dir.path().join("exported_users_June-26-2020-15-04.ucsv")
        );
        let content = fs::read_to_string(&result.path).unwrap();
        assert_eq!(content, "userId,fullName,numCoffees\nu1,Ann,3\n");
        assert_eq!(result.bytes, content.len());
    }

    #[test]
    fn test_same_minute_exports_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let service = ExportService::new(dir.path());

        let first = service.export_snapshot(&snapshot(), Format::UserList).unwrap();
        let second = service.export_snapshot(&snapshot(), Format::UserList).unwrap();

        assert_ne!(first.path, second.path);
        assert!(
            second
                .path
                .to_string_lossy()
                .ends_with("exported_users_June-26-2020-15-04-2.usrl")
        );
    }

    #[test]
    fn test_creates_export_dir_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let service = ExportService::new(&nested);

        service.export_snapshot(&snapshot(), Format::UserList).unwrap();

        let names: Vec<_> = fs::read_dir(&nested)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".usrl"));
    }

    #[test]
    fn test_strict_csv_export_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let service = ExportService::new(dir.path())
            .with_csv_options(CsvOptions::default().with_reject_unescapable(true));
        let snapshot =
            Snapshot::taken_at(vec![User::new("u1").with_display_name("A,B")], fixed_time());

        assert!(service.export_snapshot(&snapshot, Format::Csv).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
