//! Secret configuration file storage.
//!
//! Provides loading of API keys from `secret.json`.

use parley_core::ParleyError;
use parley_core::config::SecretConfig;
use std::fs;
use std::path::PathBuf;

/// Errors that can occur during secret storage operations.
#[derive(Debug)]
pub enum SecretStorageError {
    /// File I/O error.
    IoError(PathBuf, std::io::Error),
    /// JSON parsing error.
    ParseError(PathBuf, serde_json::Error),
}

impl std::fmt::Display for SecretStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStorageError::IoError(path, e) => {
                write!(f, "Failed to read {}: {}", path.display(), e)
            }
            SecretStorageError::ParseError(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for SecretStorageError {}

impl From<SecretStorageError> for ParleyError {
    fn from(err: SecretStorageError) -> Self {
        ParleyError::config(err.to_string())
    }
}

/// Storage for the secret configuration file (secret.json).
///
/// Read-only: keys are added by editing the file by hand. A missing file
/// simply means no keys are configured.
///
/// # Security Note
///
/// This storage reads plaintext JSON. The file should be mode 600.
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates a SecretStorage reading `path`.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the secret configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(SecretConfig)`: Parsed file, or an empty config if the file doesn't exist
    /// - `Err(SecretStorageError::IoError)`: Failed to read file
    /// - `Err(SecretStorageError::ParseError)`: Invalid JSON format
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No secret file, using empty config");
            return Ok(SecretConfig::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretStorageError::IoError(self.path.clone(), e))?;
        let config = serde_json::from_str(&content)
            .map_err(|e| SecretStorageError::ParseError(self.path.clone(), e))?;

        Ok(config)
    }
}
