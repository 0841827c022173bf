//! Domain layer of Parley.
//!
//! Everything here is pure: no file system, no network. The infrastructure
//! and interaction crates build on these types.

pub mod assembler;
pub mod attachment;
pub mod config;
pub mod conversation;
pub mod error;
pub mod model;

// Re-export common error type
pub use error::{ParleyError, Result};

pub use assembler::{AssembledMessage, MessageAssembler};
pub use attachment::{Attachment, AttachmentKind, AttachmentPayload, classify};
pub use config::{AppConfig, Credentials, EnvSnapshot, SecretConfig, resolve_credentials};
pub use conversation::{ChatMessage, ChatRole, ConversationStore, ConversationTurn, TurnRole};
pub use model::{ModelProfile, ModelSelector, Provider};
