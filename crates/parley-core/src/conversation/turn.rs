//! Transcript turn types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a turn in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Message typed by the user.
    User,
    /// Reply (or error notice) shown on the assistant side.
    Assistant,
}

impl TurnRole {
    /// Lowercase role name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// A single entry of the conversation transcript.
///
/// Turns are immutable once created. The fields are private so the only way
/// to obtain one is through [`ConversationTurn::new`] or the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    id: String,
    role: TurnRole,
    text: String,
    created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Creates a turn stamped with a fresh id and the current time.
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
