//! Append-only conversation transcript.

use super::{ConversationTurn, TurnRole};

/// In-memory, insertion-ordered list of turns for one session.
///
/// The order is significant: it is both the rendered transcript and the
/// history sent with the next request. There are no edit or delete
/// operations.
#[derive(Debug, Default, Clone)]
pub struct ConversationStore {
    turns: Vec<ConversationTurn>,
}

impl ConversationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a turn from `role` and `text`, appends it and returns it.
    pub fn append(&mut self, role: TurnRole, text: impl Into<String>) -> &ConversationTurn {
        self.append_turn(ConversationTurn::new(role, text))
    }

    /// Appends an already constructed turn.
    pub fn append_turn(&mut self, turn: ConversationTurn) -> &ConversationTurn {
        tracing::debug!(role = turn.role().as_str(), id = turn.id(), "Appending turn");
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// Ordered view of every turn appended so far.
    pub fn snapshot(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }
}
