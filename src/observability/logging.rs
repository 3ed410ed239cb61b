//! Logging configuration.

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable holding a log filter directive.
pub const LOG_FILTER_ENV: &str = "USERSHARE_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(Error::InvalidInput(format!("Unknown log format: {s}"))),
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive string.
    pub filter: String,
    /// Optional file to append log output to.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds the logging config from file settings and the CLI verbosity.
    ///
    /// The filter comes from `USERSHARE_LOG` if set, then `debug` when
    /// `verbose`, then the configured level, then `info`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured format is unknown.
    pub fn from_settings(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let format = settings
            .and_then(|s| s.format.as_deref())
            .map(LogFormat::from_str)
            .transpose()?
            .unwrap_or_default();

        let filter = lookup(LOG_FILTER_ENV)
            .filter(|f| !f.is_empty())
            .or_else(|| verbose.then(|| "debug".to_string()))
            .or_else(|| settings.and_then(|s| s.level.clone()))
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            format,
            filter,
            file: settings.and_then(|s| s.file.clone()),
        })
    }
}
