//! Import and export command handlers.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use usershare::config::UsershareConfig;
use usershare::io::{ExportService, Format, ImportService};
use usershare::storage::FileStore;
use usershare::{Error, Result};

/// Executes the export command.
pub fn cmd_export(config: &UsershareConfig, format: Format, dir: Option<PathBuf>) -> Result<()> {
    let store = FileStore::open(&config.data_dir)?;
    let export_dir = dir.unwrap_or_else(|| config.export_dir.clone());

    let result = ExportService::new(export_dir)
        .with_csv_options(config.csv)
        .export_store(&store, format)?;

    println!("Export completed:");
    println!("  Exported: {}", result.exported);
    println!("  Format:   {} ({})", result.format, result.format.mime_type());
    println!("  Bytes:    {}", result.bytes);
    println!("  Path:     {}", result.path.display());

    Ok(())
}

/// Executes the import command.
pub fn cmd_import(
    config: &UsershareConfig,
    file: &Path,
    assume_yes: bool,
    keep_source: bool,
) -> Result<()> {
    let remove_source = config.import.remove_source && !keep_source;
    let service = ImportService::new().with_remove_source(remove_source);

    let result = service.import_file(file)?;
    println!(
        "Read {} users from {} ({})",
        result.len(),
        file.display(),
        result.format
    );
    if result.source_removed {
        println!("Removed {}", file.display());
    }

    if result.is_empty() {
        println!("Nothing to import.");
        return Ok(());
    }

    if !assume_yes {
        let stdin = io::stdin();
        let accepted = confirm(&mut stdin.lock(), &mut io::stdout(), result.len())
            .map_err(|e| Error::OperationFailed {
                operation: "read_confirmation".to_string(),
                cause: e.to_string(),
            })?;
        if !accepted {
            println!("Import cancelled.");
            return Ok(());
        }
    }

    let mut store = FileStore::open(&config.data_dir)?;
    let summary = service.apply(&mut store, &result.users)?;

    println!("Import completed:");
    println!("  Inserted: {}", summary.inserted);
    println!("  Updated:  {}", summary.updated);

    Ok(())
}

/// Asks whether to import `count` users. Only `y` / `yes` accept.
fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, count: usize) -> io::Result<bool> {
    write!(output, "Import {count} users? [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("y\n" => true; "y")]
    #[test_case("YES\n" => true; "yes uppercase")]
    #[test_case("n\n" => false; "no")]
    #[test_case("\n" => false; "empty defaults to no")]
    #[test_case("" => false; "eof")]
    fn test_confirm(answer: &str) -> bool {
        let mut output = Vec::new();
        let accepted = confirm(&mut answer.as_bytes(), &mut output, 3).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Import 3 users? [y/N] ");
        accepted
    }
}
