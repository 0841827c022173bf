//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `turn`: Transcript entries (`TurnRole`, `ConversationTurn`)
//! - `message`: Wire-level history entries (`ChatRole`, `ChatMessage`)
//! - `store`: Append-only transcript (`ConversationStore`)

mod message;
mod store;
mod turn;

// Re-export public API
pub use message::{ChatMessage, ChatRole};
pub use store::ConversationStore;
pub use turn::{ConversationTurn, TurnRole};
