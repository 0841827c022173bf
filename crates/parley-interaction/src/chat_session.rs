//! ChatSession - one conversation with one model.
//!
//! Holds the transcript, the pending attachment set and the busy flag, and
//! runs the submit flow: assemble, record the user turn, call the provider,
//! record the reply (or the error), clear attachments.

use parley_core::assembler::MessageAssembler;
use parley_core::attachment::Attachment;
use parley_core::config::Credentials;
use parley_core::conversation::{ConversationStore, ConversationTurn, TurnRole};
use parley_core::model::ModelSelector;
use parley_core::ParleyError;
use parley_infrastructure::ingest::{AttachmentIngestor, SelectedFile};

use crate::completion_client::CompletionClient;

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent (blank input or a call already in flight).
    Ignored,
    /// The assistant replied.
    Replied { reply: String },
    /// The submission failed; an error turn was recorded.
    Failed { error: ParleyError },
}

pub struct ChatSession {
    model: ModelSelector,
    credentials: Credentials,
    client: CompletionClient,
    ingestor: AttachmentIngestor,
    assembler: MessageAssembler,
    store: ConversationStore,
    attachments: Vec<Attachment>,
    busy: bool,
}

impl ChatSession {
    /// Starts a conversation seeded with the model's greeting.
    pub fn new(model: ModelSelector, credentials: Credentials, client: CompletionClient) -> Self {
        Self {
            model,
            credentials,
            client,
            ingestor: AttachmentIngestor::new(),
            assembler: MessageAssembler::new(),
            store: greeting_store(model),
            attachments: Vec::new(),
            busy: false,
        }
    }

    pub fn model(&self) -> ModelSelector {
        self.model
    }

    /// Whether an API key is configured for the current model.
    pub fn has_credential(&self) -> bool {
        self.credentials.has(self.model)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        self.store.snapshot()
    }

    pub fn pending_attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Replaces the conversation with a fresh one for `model`.
    ///
    /// Pending attachments are dropped along with the transcript.
    pub fn switch_model(&mut self, model: ModelSelector) {
        tracing::info!(from = %self.model, to = %model, "Switching model, starting new conversation");
        self.model = model;
        self.store = greeting_store(model);
        self.attachments.clear();
    }

    /// Ingests `files` and adds the accepted ones to the pending set.
    ///
    /// Returns one notice per skipped file.
    pub async fn attach(&mut self, files: Vec<SelectedFile>) -> Vec<ParleyError> {
        let report = self.ingestor.ingest_all(files).await;
        self.attachments.extend(report.attachments);
        report.rejected
    }

    /// Removes a pending attachment. Returns false if `id` is unknown.
    pub fn remove_attachment(&mut self, id: &str) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.id != id);
        self.attachments.len() != before
    }

    /// Sends `text` plus the pending attachments.
    ///
    /// The busy flag is raised for the duration of the call. It is lowered and
    /// the pending attachments are cleared even if the returned future is
    /// dropped before the provider answers.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        if self.busy {
            tracing::debug!("Submission ignored, request in flight");
            return SubmitOutcome::Ignored;
        }

        let assembled = self
            .assembler
            .assemble(self.store.snapshot(), text, &self.attachments);
        let Some(assembled) = assembled else {
            return SubmitOutcome::Ignored;
        };

        let Self {
            model,
            credentials,
            client,
            store,
            attachments,
            busy,
            ..
        } = self;

        store.append(TurnRole::User, assembled.display_text);
        let _guard = BusyGuard::raise(busy, attachments);

        let result = client
            .complete(*model, credentials, &assembled.messages)
            .await;

        match result {
            Ok(reply) => {
                store.append(TurnRole::Assistant, reply.clone());
                SubmitOutcome::Replied { reply }
            }
            Err(error) => {
                tracing::error!(model = %model, error = %error, "Chat error");
                store.append(TurnRole::Assistant, format!("Fehler: {error}"));
                SubmitOutcome::Failed { error }
            }
        }
    }
}

/// Holds the busy flag up while a submission is in flight.
struct BusyGuard<'a> {
    busy: &'a mut bool,
    attachments: &'a mut Vec<Attachment>,
}

impl<'a> BusyGuard<'a> {
    fn raise(busy: &'a mut bool, attachments: &'a mut Vec<Attachment>) -> Self {
        *busy = true;
        Self { busy, attachments }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.busy = false;
        self.attachments.clear();
    }
}

fn greeting_store(model: ModelSelector) -> ConversationStore {
    let mut store = ConversationStore::new();
    store.append(TurnRole::Assistant, model.greeting());
    store
}
