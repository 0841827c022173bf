//! Attachment domain model and file classification.

use serde::{Deserialize, Serialize};

/// MIME type of Office Open XML word-processing documents.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Classified category of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Pdf,
    Docx,
    Text,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Pdf => "pdf",
            AttachmentKind::Docx => "docx",
            AttachmentKind::Text => "text",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, AttachmentKind::Image)
    }
}

/// Classifies a file by MIME type and file name.
///
/// Rules are checked in order: `image/*`, PDF, DOCX, plain text. Extension
/// matching ignores case. Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use parley_core::attachment::{classify, AttachmentKind};
///
/// assert_eq!(classify(Some("image/png"), "cat.png"), Some(AttachmentKind::Image));
/// assert_eq!(classify(None, "Report.PDF"), Some(AttachmentKind::Pdf));
/// assert_eq!(classify(Some("application/zip"), "bundle.zip"), None);
/// ```
pub fn classify(mime_type: Option<&str>, file_name: &str) -> Option<AttachmentKind> {
    let mime = mime_type.unwrap_or("").trim().to_ascii_lowercase();
    let name = file_name.to_ascii_lowercase();

    if mime.starts_with("image/") {
        return Some(AttachmentKind::Image);
    }
    if mime == "application/pdf" || name.ends_with(".pdf") {
        return Some(AttachmentKind::Pdf);
    }
    if mime == DOCX_MIME_TYPE || name.ends_with(".docx") {
        return Some(AttachmentKind::Docx);
    }
    if mime == "text/plain" || name.ends_with(".txt") {
        return Some(AttachmentKind::Text);
    }
    None
}

/// Derived content of an attachment.
///
/// Images carry a preview reference and an inline data URL; every other kind
/// carries extracted text. Keeping this as an enum means an image can never
/// have extracted text and a document can never have a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttachmentPayload {
    Image {
        preview_reference: String,
        data_url: String,
    },
    Document {
        extracted_text: String,
    },
}

/// A user-selected file plus its derived preview or extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier within the pending attachment set
    pub id: String,
    /// Original file name
    pub file_name: String,
    /// MIME type reported for (or guessed from) the file
    pub mime_type: Option<String>,
    /// File size in bytes
    pub size: u64,
    /// Classified kind
    pub kind: AttachmentKind,
    payload: AttachmentPayload,
}

impl Attachment {
    /// Creates an image attachment.
    pub fn image(
        id: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: Option<String>,
        size: u64,
        preview_reference: impl Into<String>,
        data_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            mime_type,
            size,
            kind: AttachmentKind::Image,
            payload: AttachmentPayload::Image {
                preview_reference: preview_reference.into(),
                data_url: data_url.into(),
            },
        }
    }

    /// Creates a document attachment (PDF, DOCX or text).
    ///
    /// Passing [`AttachmentKind::Image`] is an internal error.
    pub fn document(
        id: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: Option<String>,
        size: u64,
        kind: AttachmentKind,
        extracted_text: impl Into<String>,
    ) -> crate::Result<Self> {
        let file_name = file_name.into();
        if kind.is_image() {
            return Err(crate::ParleyError::internal(format!(
                "image attachment '{file_name}' cannot carry extracted text"
            )));
        }
        Ok(Self {
            id: id.into(),
            file_name,
            mime_type,
            size,
            kind,
            payload: AttachmentPayload::Document {
                extracted_text: extracted_text.into(),
            },
        })
    }

    pub fn payload(&self) -> &AttachmentPayload {
        &self.payload
    }

    pub fn is_image(&self) -> bool {
        self.kind.is_image()
    }

    /// Displayable reference, present only for images.
    pub fn preview_reference(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::Image {
                preview_reference, ..
            } => Some(preview_reference),
            AttachmentPayload::Document { .. } => None,
        }
    }

    /// Base64 data URL, present only for images.
    pub fn data_url(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::Image { data_url, .. } => Some(data_url),
            AttachmentPayload::Document { .. } => None,
        }
    }

    /// Extracted text, present only for non-image attachments.
    pub fn extracted_text(&self) -> Option<&str> {
        match &self.payload {
            AttachmentPayload::Document { extracted_text } => Some(extracted_text),
            AttachmentPayload::Image { .. } => None,
        }
    }
}
