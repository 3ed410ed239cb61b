//! Configuration management.
//!
//! Settings come from a TOML file, then environment overrides. Every field
//! of the file is optional; anything left out keeps its default.

use crate::io::CsvOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "USERSHARE_CONFIG_PATH";
/// Environment variable overriding [`UsershareConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "USERSHARE_DATA_DIR";
/// Environment variable overriding [`UsershareConfig::export_dir`].
pub const EXPORT_DIR_ENV: &str = "USERSHARE_EXPORT_DIR";

const APP_DIR: &str = "usershare";

/// Main configuration for usershare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsershareConfig {
    /// Directory holding the user store.
    pub data_dir: PathBuf,
    /// Directory export files are written to.
    pub export_dir: PathBuf,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Import behavior.
    pub import: ImportSettings,
    /// CSV export options.
    pub csv: CsvOptions,
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive, e.g. `info` or `usershare=debug`.
    pub level: Option<String>,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Import behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSettings {
    /// Delete the received file after an import attempt.
    pub remove_source: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            remove_source: true,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Export directory.
    pub export_dir: Option<String>,
    /// Logging configuration.
    pub logging: Option<LoggingSettings>,
    /// Import configuration.
    pub import: Option<ConfigFileImport>,
    /// CSV configuration.
    pub csv: Option<ConfigFileCsv>,
}

/// `[import]` table.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileImport {
    /// Delete received files after import.
    pub remove_source: Option<bool>,
}

/// `[csv]` table.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileCsv {
    /// Reject values containing a comma or line break on export.
    pub reject_unescapable: Option<bool>,
}

impl Default for UsershareConfig {
    fn default() -> Self {
        let data_dir = directories::BaseDirs::new().map_or_else(
            || PathBuf::from(".usershare"),
            |dirs| dirs.data_local_dir().join(APP_DIR),
        );
        Self {
            export_dir: data_dir.join("exports"),
            data_dir,
            logging: LoggingSettings::default(),
            import: ImportSettings::default(),
            csv: CsvOptions::default(),
        }
    }
}

impl UsershareConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// Loads configuration with a custom environment lookup.
    ///
    /// The file is taken from `explicit`, then `USERSHARE_CONFIG_PATH`, then
    /// the platform config directory. Environment overrides apply last.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen config file cannot be read or parsed.
    pub fn load_with(explicit: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_PATH_ENV).filter(|p| !p.is_empty()).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default()?,
        };
        config.apply_env(lookup);
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::io("read_config_file", path, &e))?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| {
            Error::InvalidInput(format!("invalid config file {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the platform config directory
    /// (`~/.config/usershare/config.toml` on Linux).
    ///
    /// Returns default configuration if no config file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_default() -> Result<Self> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Ok(Self::default());
        };

        let path = base_dirs.config_dir().join(APP_DIR).join("config.toml");
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Converts a `ConfigFile` to `UsershareConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
            config.export_dir = config.data_dir.join("exports");
        }
        if let Some(export_dir) = file.export_dir {
            config.export_dir = PathBuf::from(export_dir);
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(remove) = file.import.and_then(|i| i.remove_source) {
            config.import.remove_source = remove;
        }
        if let Some(reject) = file.csv.and_then(|c| c.reject_unescapable) {
            config.csv.reject_unescapable = reject;
        }

        config
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(data_dir) = non_empty(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(export_dir) = non_empty(EXPORT_DIR_ENV) {
            self.export_dir = PathBuf::from(export_dir);
        }
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the export directory.
    #[must_use]
    pub fn with_export_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_dir = path.into();
        self
    }

    /// Renders the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::OperationFailed {
            operation: "render_config".to_string(),
            cause: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = UsershareConfig::default();
        assert!(config.import.remove_source);
        assert!(!config.csv.reject_unescapable);
        assert_eq!(config.export_dir, config.data_dir.join("exports"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
data_dir = "/var/lib/usershare"

[logging]
format = "json"
level = "debug"

[import]
remove_source = false

[csv]
reject_unescapable = true
"#,
        );

        let config = UsershareConfig::load_with(Some(&path), no_env).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/usershare"));
        assert_eq!(config.export_dir, PathBuf::from("/var/lib/usershare/exports"));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert!(!config.import.remove_source);
        assert!(config.csv.reject_unescapable);
    }

    #[test]
    fn test_config_path_from_env() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "export_dir = \"/tmp/out\"\n");
        let env = HashMap::from([(CONFIG_PATH_ENV, path.to_string_lossy().into_owned())]);

        let config = UsershareConfig::load_with(None, |k| env.get(k).cloned()).unwrap();

        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "data_dir = \"/from/file\"\n");
        let env = HashMap::from([
            (DATA_DIR_ENV, "/from/env".to_string()),
            (EXPORT_DIR_ENV, String::new()),
        ]);

        let config = UsershareConfig::load_with(Some(&path), |k| env.get(k).cloned()).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/from/env"));
        assert_eq!(config.export_dir, PathBuf::from("/from/file/exports"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = UsershareConfig::load_with(Some(&dir.path().join("nope.toml")), no_env);
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "unknown_key = 1\n");
        let result = UsershareConfig::load_with(Some(&path), no_env);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_to_toml() {
        let config = UsershareConfig::default().with_data_dir("/data").with_export_dir("/out");
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("data_dir = \"/data\""));
        assert!(rendered.contains("remove_source = true"));
    }
}
