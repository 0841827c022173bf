//! Path management for Parley configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/parley/            # Config directory (platform default)
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys
//! ```
//!
//! `PARLEY_CONFIG_DIR` replaces the whole directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use parley_core::config::SecretConfig;

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "PARLEY_CONFIG_DIR";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolved locations of Parley's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParleyPaths {
    config_dir: PathBuf,
}

impl ParleyPaths {
    /// Resolves paths from `PARLEY_CONFIG_DIR` or the platform config directory.
    pub fn new() -> Result<Self, PathError> {
        Self::from_override(std::env::var_os(CONFIG_DIR_ENV))
    }

    /// Resolves paths from an explicit override value.
    ///
    /// An empty override is ignored.
    pub fn from_override(override_dir: Option<OsString>) -> Result<Self, PathError> {
        if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(dir)));
        }
        let base = dirs::config_dir().ok_or(PathError::ConfigDirNotFound)?;
        Ok(Self::with_root(base.join("parley")))
    }

    /// Uses `config_dir` as-is (for testing).
    pub fn with_root(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the path to config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Returns the path to secret.json.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> PathBuf {
        self.config_dir.join("secret.json")
    }

    /// Ensures the secret file exists, creating an empty template if it doesn't.
    ///
    /// On Unix the new file gets mode 600. An existing file is left untouched.
    pub fn ensure_secret_file(&self) -> Result<PathBuf, std::io::Error> {
        let secret_path = self.secret_file();

        if secret_path.exists() {
            return Ok(secret_path);
        }

        std::fs::create_dir_all(&self.config_dir)?;

        let template = SecretConfig {
            deepseek_v3_api_key: Some(String::new()),
            deepseek_r1_api_key: Some(String::new()),
        };
        let template_json = serde_json::to_string_pretty(&template).map_err(std::io::Error::other)?;
        std::fs::write(&secret_path, template_json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        tracing::info!(path = %secret_path.display(), "Created secret file template");
        Ok(secret_path)
    }
}
