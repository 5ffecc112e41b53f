//! Conversation-related types.

use omo_model::ModelMessage;

use crate::tool::ToolResult;

/// The assistant entry recorded for a round that only requested tools.
pub const TOOL_CALL_PLACEHOLDER: &str = "(tool call)";

/// The author of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The user, or a synthetic entry carrying a tool result.
    User,
    /// The model.
    Assistant,
}

/// An entry in the transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Creates a user-role entry.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant-role entry.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Creates the synthetic user-role entry reporting a tool outcome.
    pub fn tool_outcome(name: &str, outcome: &ToolResult) -> Self {
        match outcome {
            Ok(result) => Self::user(format!("Tool \"{name}\" returned: {result}")),
            Err(err) => Self::user(format!("Tool \"{name}\" error: {err}")),
        }
    }

    /// Returns the author of this entry.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this entry.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    fn to_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.content.clone()),
            Role::Assistant => ModelMessage::Assistant(self.content.clone()),
        }
    }
}

/// The ordered, append-only record of a conversation.
#[derive(Clone, Default, Debug)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Returns all entries, oldest first.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if nothing has been said yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the most recent entry.
    #[inline]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    #[inline]
    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub(crate) fn to_messages(&self) -> Vec<ModelMessage> {
        self.turns.iter().map(Turn::to_message).collect()
    }
}
