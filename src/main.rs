//! Binary entry point for usershare.
//!
//! This binary provides the CLI for exporting, importing, and managing the
//! local user list.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use usershare::config::UsershareConfig;
use usershare::io::Format;
use usershare::observability;

use commands::ListFormat;

/// Usershare - share a user list as `.usrl` or `.ucsv` files.
#[derive(Parser)]
#[command(name = "usershare")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Export all users to a new timestamped file.
    Export {
        /// Output format: usrl or ucsv.
        #[arg(short, long, default_value = "usrl", value_parser = parse_format)]
        format: Format,

        /// Directory to write to (defaults to the configured export dir).
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Import users from a received `.usrl` or `.ucsv` file.
    Import {
        /// File to import.
        path: PathBuf,

        /// Import without asking for confirmation.
        #[arg(short, long)]
        yes: bool,

        /// Keep the file after reading it.
        #[arg(long)]
        keep_source: bool,
    },

    /// List stored users.
    List {
        /// Output format: table or json.
        #[arg(short, long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// Add or replace a user.
    Add {
        /// User id.
        #[arg(long)]
        id: String,

        /// Display name.
        #[arg(short, long)]
        name: Option<String>,

        /// Visit count.
        #[arg(long, default_value_t = 0)]
        visits: u64,
    },

    /// Delete a user.
    Delete {
        /// User id.
        id: String,
    },

    /// Show the effective configuration.
    Config,
}

fn parse_format(value: &str) -> Result<Format, String> {
    value.parse::<Format>().map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match UsershareConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_config(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = e.kind(), "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn run_command(command: Commands, config: &UsershareConfig) -> usershare::Result<()> {
    match command {
        Commands::Export { format, dir } => commands::cmd_export(config, format, dir),
        Commands::Import {
            path,
            yes,
            keep_source,
        } => commands::cmd_import(config, &path, yes, keep_source),
        Commands::List { format } => commands::cmd_list(config, format),
        Commands::Add { id, name, visits } => commands::cmd_add(config, id, name, visits),
        Commands::Delete { id } => commands::cmd_delete(config, &id),
        Commands::Config => commands::cmd_config(config),
    }
}
