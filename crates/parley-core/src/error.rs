//! Error types for Parley.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Parley workspace.
///
/// Variants map onto the failure kinds a chat submission can run into.
/// Some are absorbed locally (unsupported files, failed extraction, malformed
/// replies) and some end the submission with a single transcript entry
/// (missing credential, remote failures).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParleyError {
    /// The selected file is not an image, PDF, DOCX or plain-text file.
    ///
    /// The display string is the notice shown to the user.
    #[error("Nicht unterstützte Datei: {file_name}")]
    UnsupportedFileType { file_name: String },

    /// Text could not be extracted from a document.
    #[error("Extraction failed for {file_name}: {message}")]
    Extraction { file_name: String, message: String },

    /// No API key is configured for the selected model.
    #[error("API key not found for {model}")]
    MissingCredential { model: String },

    /// The provider answered with a non-success status.
    #[error("{provider} API Error: {status} - {body}")]
    RemoteRequest {
        provider: String,
        status: u16,
        body: String,
    },

    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    /// A success response did not have the expected shape.
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an UnsupportedFileType error
    pub fn unsupported_file(file_name: impl Into<String>) -> Self {
        Self::UnsupportedFileType {
            file_name: file_name.into(),
        }
    }

    /// Creates an Extraction error
    pub fn extraction(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            file_name: file_name.into(),
            message: message.into(),
        }
    }

    /// Creates a MissingCredential error
    pub fn missing_credential(model: impl Into<String>) -> Self {
        Self::MissingCredential {
            model: model.into(),
        }
    }

    /// Creates a RemoteRequest error
    pub fn remote_request(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::RemoteRequest {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates a Transport error
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an UnsupportedFileType error
    pub fn is_unsupported_file(&self) -> bool {
        matches!(self, Self::UnsupportedFileType { .. })
    }

    /// Check if this is a MissingCredential error
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }

    /// HTTP status carried by a RemoteRequest error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is absorbed per file instead of failing a submission.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFileType { .. } | Self::Extraction { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ParleyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ParleyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ParleyError>`.
pub type Result<T> = std::result::Result<T, ParleyError>;
