//! Attachment ingestion.
//!
//! Turns user-selected files into [`Attachment`]s: images get a preview
//! reference and a base64 data URL, documents get their text extracted.
//! Decoding runs on the blocking pool, files are processed one at a time.

mod docx;
mod pdf;

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::Utc;
use parley_core::attachment::{Attachment, AttachmentKind, classify};
use parley_core::{ParleyError, Result};
use tokio::task;
use uuid::Uuid;

pub use pdf::fallback_text as pdf_fallback_text;

/// Raw file handed to the ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Location on disk, when the file came from one
    pub path: Option<PathBuf>,
}

impl SelectedFile {
    /// Builds an in-memory file.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes: bytes.into(),
            path: None,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ParleyError::io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let absolute = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path).first().map(|m| m.to_string());

        Ok(Self {
            name,
            mime_type,
            bytes,
            path: Some(absolute),
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Outcome of ingesting one selection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Accepted attachments in selection order
    pub attachments: Vec<Attachment>,
    /// Per-file notices for skipped files
    pub rejected: Vec<ParleyError>,
}

/// Converts selected files into attachments.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttachmentIngestor;

impl AttachmentIngestor {
    pub fn new() -> Self {
        Self
    }

    /// Ingests every file in order and aggregates the results.
    pub async fn ingest_all(&self, files: Vec<SelectedFile>) -> IngestReport {
        tracing::debug!(count = files.len(), "Processing selected files");

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.ingest(file).await);
        }

        let mut report = IngestReport::default();
        for result in results {
            match result {
                Ok(attachment) => report.attachments.push(attachment),
                Err(err) => report.rejected.push(err),
            }
        }

        tracing::debug!(
            accepted = report.attachments.len(),
            rejected = report.rejected.len(),
            "Added attachments"
        );
        report
    }

    /// Ingests one file.
    ///
    /// Fails only for unsupported file types or an internal task failure.
    /// Documents that cannot be decoded still produce an attachment.
    pub async fn ingest(&self, file: SelectedFile) -> Result<Attachment> {
        let kind = classify(file.mime_type.as_deref(), &file.name).ok_or_else(|| {
            tracing::warn!(file = %file.name, mime = ?file.mime_type, "Unsupported file");
            ParleyError::unsupported_file(&file.name)
        })?;

        let id = attachment_id(&file.name, file.size());
        tracing::debug!(file = %file.name, kind = kind.as_str(), %id, "Processing file");

        match kind {
            AttachmentKind::Image => Ok(image_attachment(id, file)),
            AttachmentKind::Pdf => {
                let text = decode_blocking(&file, pdf::extract_text)
                    .await
                    .unwrap_or_else(|err| {
                        tracing::warn!(file = %file.name, error = %err, "PDF text extraction failed, using fallback");
                        pdf::fallback_text(&file.name)
                    });
                document_attachment(id, file, kind, text)
            }
            AttachmentKind::Docx => {
                let text = decode_blocking(&file, docx::extract_text)
                    .await
                    .unwrap_or_else(|err| {
                        tracing::warn!(file = %file.name, error = %err, "DOCX text extraction failed");
                        String::new()
                    });
                document_attachment(id, file, kind, text)
            }
            AttachmentKind::Text => {
                let text = String::from_utf8_lossy(&file.bytes).into_owned();
                document_attachment(id, file, kind, text)
            }
        }
    }
}

/// Runs a decoder on the blocking pool. A panic inside it becomes an error.
async fn decode_blocking(
    file: &SelectedFile,
    decoder: fn(&str, &[u8]) -> Result<String>,
) -> Result<String> {
    let name = file.name.clone();
    let bytes = file.bytes.clone();
    task::spawn_blocking(move || decoder(&name, &bytes))
        .await
        .map_err(|e| ParleyError::extraction(&file.name, format!("decoder task failed: {e}")))?
}

fn attachment_id(name: &str, size: u64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}-{}",
        name,
        size,
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

fn image_attachment(id: String, file: SelectedFile) -> Attachment {
    let mime = file
        .mime_type
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(&file.name)
                .first_or_octet_stream()
                .to_string()
        });
    let data_url = format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(&file.bytes));
    let preview_reference = match &file.path {
        Some(path) => format!("file://{}", path.display()),
        None => format!("attachment://{id}"),
    };
    let size = file.size();

    Attachment::image(id, file.name, file.mime_type, size, preview_reference, data_url)
}

fn document_attachment(
    id: String,
    file: SelectedFile,
    kind: AttachmentKind,
    text: String,
) -> Result<Attachment> {
    tracing::debug!(file = %file.name, chars = text.chars().count(), "Text extracted");
    let size = file.size();
    Attachment::document(id, file.name, file.mime_type, size, kind, text)
}
