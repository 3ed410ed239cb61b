//! CSV format adapter (`.ucsv`).
//!
//! The first line is the schema's field names joined by commas; each
//! following line is one record's values in the same order. Values are never
//! quoted or escaped, so a value containing a comma or a line break cannot
//! survive a round trip. Exports log such values loudly, or reject them when
//! [`CsvOptions::reject_unescapable`] is set.
//!
//! Import is header-driven: columns are looked up by name, not position, so
//! a file whose columns are in a different order decodes to the same records.
//! Rows are turned into a canonical structured document and decoded by
//! [`super::json`], which keeps validation identical across both formats.

use super::Format;
use super::json;
use crate::io::schema::{FieldKind, Schema};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Options for CSV export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Fail the export instead of warning when a value contains a comma or
    /// a line break.
    pub reject_unescapable: bool,
}

impl CsvOptions {
    /// Sets whether unescapable values fail the export.
    #[must_use]
    pub const fn with_reject_unescapable(mut self, reject: bool) -> Self {
        self.reject_unescapable = reject;
        self
    }
}

/// One data line of a CSV file, keyed by header column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    /// One-based line number in the source file.
    pub line: usize,
    /// Column name to raw cell text. Columns past the end of a short row
    /// are absent.
    pub cells: BTreeMap<String, String>,
}

impl CsvRow {
    /// Zips a header with a row's values.
    ///
    /// Extra values beyond the header are dropped. When the header repeats a
    /// column name, the first occurrence wins.
    #[must_use]
    pub fn zip<'a>(
        line: usize,
        header: impl IntoIterator<Item = &'a str>,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut cells = BTreeMap::new();
        for (name, value) in header.into_iter().zip(values) {
            cells
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
        Self { line, cells }
    }
}

/// Encodes records as CSV text.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `options.reject_unescapable` is set and
/// a value contains a comma or line break, or an error if writing fails.
pub fn encode_csv<T: Serialize>(
    schema: &Schema,
    records: &[T],
    options: &CsvOptions,
) -> Result<String> {
    let objects = json::to_objects(schema, records)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(schema.field_names())
        .map_err(|e| write_error(&e))?;

    for (index, object) in objects.iter().enumerate() {
        let cells: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| FieldKind::stringify(object.get(f.name)))
            .collect();
        check_unescapable(schema, index, &cells, options)?;
        writer.write_record(&cells).map_err(|e| write_error(&e))?;
    }

    let bytes = writer.into_inner().map_err(|e| Error::OperationFailed {
        operation: "flush_csv".to_string(),
        cause: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| Error::OperationFailed {
        operation: "encode_ucsv".to_string(),
        cause: e.to_string(),
    })
}

/// Decodes CSV bytes into records.
///
/// # Errors
///
/// - [`Error::MalformedDocument`] if there is no header line or the text is
///   not UTF-8
/// - [`Error::FieldCoercion`] if a cell cannot be coerced to its field type
/// - [`Error::SchemaMismatch`] if the header lacks a schema column or the
///   resulting document fails validation
pub fn decode_csv<T: DeserializeOwned>(schema: &Schema, bytes: &[u8]) -> Result<Vec<T>> {
    let CsvTable { header, rows } = read_table(bytes)?;
    check_header(schema, &header)?;
    let lines: Vec<usize> = rows.iter().map(|r| r.line).collect();

    let document = rows_to_document(schema, &rows)?;
    let canonical = serde_json::to_vec(&document).map_err(|e| Error::OperationFailed {
        operation: "encode_canonical_document".to_string(),
        cause: e.to_string(),
    })?;

    json::decode_as(schema, Format::Csv, &canonical).map_err(|e| match e {
        Error::SchemaMismatch {
            format,
            record: Some(index),
            field,
            reason,
        } => Error::SchemaMismatch {
            format,
            record: Some(index),
            field,
            reason: lines
                .get(index)
                .map_or(reason.clone(), |line| format!("{reason} (line {line})")),
        },
        other => other,
    })
}

/// A parsed CSV file: header columns in file order plus the data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    /// Column names from the header line, as written.
    pub header: Vec<String>,
    /// Data rows keyed by header column name.
    pub rows: Vec<CsvRow>,
}

/// Splits CSV bytes into a header and header-keyed rows.
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns [`Error::MalformedDocument`] if the input has no header line or
/// is not valid UTF-8.
pub fn read_table(bytes: &[u8]) -> Result<CsvTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(bytes);

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| Error::MalformedDocument {
            format: Format::Csv,
            cause: e.to_string(),
        })?;
        if record.len() <= 1 && record.iter().all(str::is_empty) {
            continue;
        }

        let line = record
            .position()
            .map_or(0, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));

        match header {
            None => header = Some(record.iter().map(String::from).collect()),
            Some(ref columns) => {
                rows.push(CsvRow::zip(
                    line,
                    columns.iter().map(String::as_str),
                    record.iter(),
                ));
            },
        }
    }

    let Some(header) = header else {
        return Err(Error::MalformedDocument {
            format: Format::Csv,
            cause: "missing header line".to_string(),
        });
    };
    Ok(CsvTable { header, rows })
}

/// Checks header columns against the schema.
///
/// Columns the schema does not know are logged and ignored. A schema field
/// with no column would silently take its default for every row, so it
/// rejects the file.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] naming the first schema field missing
/// from the header.
pub fn check_header(schema: &Schema, header: &[String]) -> Result<()> {
    let unknown: Vec<&str> = header
        .iter()
        .map(String::as_str)
        .filter(|column| schema.field(column).is_none())
        .collect();
    for column in &unknown {
        tracing::warn!(format = %Format::Csv, column = %column, "unknown column ignored");
    }

    let Some(missing) = schema
        .fields()
        .iter()
        .find(|spec| !header.iter().any(|column| column == spec.name))
    else {
        return Ok(());
    };

    let mut reason = "header is missing column".to_string();
    if !unknown.is_empty() {
        let listed: Vec<String> = unknown.iter().map(|c| format!("'{c}'")).collect();
        reason.push_str(&format!(" (unrecognized columns: {})", listed.join(", ")));
    }
    Err(Error::SchemaMismatch {
        format: Format::Csv,
        record: None,
        field: Some(missing.name.to_string()),
        reason,
    })
}

/// Converts header-keyed rows into the canonical structured document.
///
/// Every schema field is looked up by name and coerced to its declared type;
/// absent cells take the field's default.
///
/// # Errors
///
/// Returns [`Error::FieldCoercion`] for the first cell that cannot be
/// coerced.
pub fn rows_to_document(schema: &Schema, rows: &[CsvRow]) -> Result<Value> {
    rows.iter()
        .map(|row| {
            schema
                .fields()
                .iter()
                .map(|spec| {
                    let raw = row.cells.get(spec.name).map(String::as_str);
                    spec.kind
                        .coerce(spec.name, raw)
                        .map(|value| (spec.name.to_string(), value))
                        .map_err(|e| at_line(e, row.line))
                })
                .collect::<Result<Map<String, Value>>>()
                .map(Value::Object)
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn at_line(err: Error, line: usize) -> Error {
    match err {
        Error::FieldCoercion { field, raw, .. } => Error::FieldCoercion { field, raw, line },
        other => other,
    }
}

fn check_unescapable(
    schema: &Schema,
    index: usize,
    cells: &[String],
    options: &CsvOptions,
) -> Result<()> {
    let offending = schema
        .fields()
        .iter()
        .zip(cells)
        .find(|(_, cell)| cell.contains([',', '\n', '\r']));

    let Some((spec, _)) = offending else {
        return Ok(());
    };

    if options.reject_unescapable {
        return Err(Error::InvalidInput(format!(
            "record {index} field '{}' contains a comma or line break, which CSV export cannot escape",
            spec.name
        )));
    }

    tracing::warn!(
        record = index,
        field = spec.name,
        "CSV value contains a comma or line break and will not import back intact"
    );
    Ok(())
}

fn write_error(e: &csv::Error) -> Error {
    Error::OperationFailed {
        operation: "write_csv".to_string(),
        cause: e.to_string(),
    }
}
