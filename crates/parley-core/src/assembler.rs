//! Builds the outgoing user message from typed text and attachments.

use crate::attachment::Attachment;
use crate::conversation::{ChatMessage, ConversationTurn};

/// Content used when only attachments were submitted.
pub const ATTACHMENT_ONLY_PLACEHOLDER: &str = "[Anhang hinzugefügt]";

/// Result of assembling one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    /// Text of the user turn shown in the transcript.
    pub display_text: String,
    /// Full user message including document blocks and the image summary.
    pub content: String,
    /// Prior history followed by the new user message.
    pub messages: Vec<ChatMessage>,
}

/// Stateless assembler for outgoing messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageAssembler;

impl MessageAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assembles the request for one submission.
    ///
    /// Returns `None` when there is nothing to send (blank text and no
    /// attachments). The output depends only on the arguments.
    pub fn assemble(
        &self,
        history: &[ConversationTurn],
        typed_text: &str,
        attachments: &[Attachment],
    ) -> Option<AssembledMessage> {
        let trimmed = typed_text.trim();
        if trimmed.is_empty() && attachments.is_empty() {
            return None;
        }

        let display_text = if trimmed.is_empty() {
            ATTACHMENT_ONLY_PLACEHOLDER.to_string()
        } else {
            trimmed.to_string()
        };

        let mut content = display_text.clone();

        let document_text = document_blocks(attachments);
        if !document_text.is_empty() {
            content.push_str(&document_text);
        }

        if let Some(summary) = image_summary(attachments) {
            content.push_str(&summary);
        }

        tracing::debug!(
            attachments = attachments.len(),
            history = history.len(),
            content_len = content.len(),
            "Assembled outgoing message"
        );

        let mut messages: Vec<ChatMessage> = history.iter().map(ChatMessage::from).collect();
        messages.push(ChatMessage::user(content.clone()));

        Some(AssembledMessage {
            display_text,
            content,
            messages,
        })
    }
}

/// One labeled block per document with text, joined by a blank line.
fn document_blocks(attachments: &[Attachment]) -> String {
    attachments
        .iter()
        .filter(|a| !a.is_image())
        .filter_map(|a| {
            a.extracted_text()
                .filter(|text| !text.is_empty())
                .map(|text| format!("\n\n--- Datei: {} ---\n{}", a.file_name, text))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Images are only named, their bytes are not sent.
fn image_summary(attachments: &[Attachment]) -> Option<String> {
    let names: Vec<&str> = attachments
        .iter()
        .filter(|a| a.is_image())
        .map(|a| a.file_name.as_str())
        .collect();

    if names.is_empty() {
        return None;
    }

    Some(format!(
        "\n\n[{} Bild(er) angehängt: {}]",
        names.len(),
        names.join(", ")
    ))
}
