//! Command handlers module.
//!
//! - `io.rs`: export and import commands
//! - `users.rs`: user store management (list, add, delete)
//! - `config.rs`: configuration display command

mod config;
mod io;
mod users;

use clap::ValueEnum;

// Re-export command functions
pub use config::cmd_config;
pub use io::{cmd_export, cmd_import};
pub use users::{cmd_add, cmd_delete, cmd_list};

/// Output format for `list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Aligned columns.
    #[default]
    Table,
    /// Pretty-printed JSON array.
    Json,
}
