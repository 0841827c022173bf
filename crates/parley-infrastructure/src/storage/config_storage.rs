//! Application config file storage (config.toml).

use parley_core::ParleyError;
use parley_core::config::AppConfig;
use std::fs;
use std::path::PathBuf;

/// Errors that can occur during config storage operations.
#[derive(Debug)]
pub enum ConfigStorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
}

impl std::fmt::Display for ConfigStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigStorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigStorageError {}

impl From<std::io::Error> for ConfigStorageError {
    fn from(e: std::io::Error) -> Self {
        ConfigStorageError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigStorageError {
    fn from(e: toml::de::Error) -> Self {
        ConfigStorageError::TomlParseError(e)
    }
}

impl From<ConfigStorageError> for ParleyError {
    fn from(err: ConfigStorageError) -> Self {
        match err {
            ConfigStorageError::IoError(e) => e.into(),
            ConfigStorageError::TomlParseError(e) => e.into(),
        }
    }
}

/// Reads `config.toml`. The file is edited by hand.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a ConfigStorage reading `path`.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the config, falling back to defaults when the file is missing.
    pub fn load(&self) -> Result<AppConfig, ConfigStorageError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
