//! Append-only conversation history.

use super::chat::{ChatMessage, MessageRole};

/// Ordered, append-only sequence of messages for a single run.
///
/// The remote model consumes the full history on every call, so messages are
/// never removed or rewritten once pushed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation holding only the user's opening message.
    pub fn from_user(prompt: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push(ChatMessage::user(prompt));
        conversation
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Messages with the `tool` role, in conversation order.
    pub fn tool_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

impl From<Vec<ChatMessage>> for Conversation {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}
