//! Talking to the provider: the completion client and the chat session
//! that drives one conversation.

pub mod chat_session;
pub mod completion_client;

pub use chat_session::{ChatSession, SubmitOutcome};
pub use completion_client::{
    ChatTransport, CompletionClient, CompletionPayload, EMPTY_REPLY_PLACEHOLDER, HttpTransport,
    TransportError, TransportRequest, TransportResponse,
};
