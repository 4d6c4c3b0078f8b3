use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opening line shown before the visitor has typed anything.
pub const GREETING: &str =
    "Hello! I'm your MapleLeaf AI expert. How can I help you with Canadian rentals today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn turn(&self) -> ChatTurn {
        ChatTurn {
            role: self.role,
            text: self.text.clone(),
        }
    }
}

/// Role and text only; what the completion API sees of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Append-only message log for one chat session.
///
/// `awaiting_reply` is raised by [`ConversationStore::append_user`] and lowered by the next
/// [`ConversationStore::append_model`]; it drives the typing indicator.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<ChatMessage>,
    awaiting_reply: bool,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(ChatRole::Model, GREETING)],
            awaiting_reply: false,
        }
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

    pub fn is_loading(&self) -> bool {
        self.awaiting_reply
    }

    pub fn history(&self) -> Vec<ChatTurn> {
        self.messages.iter().map(ChatMessage::turn).collect()
    }

    pub fn append_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.awaiting_reply = true;
        self.push(ChatMessage::new(ChatRole::User, text))
    }

    pub fn append_model(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.awaiting_reply = false;
        self.push(ChatMessage::new(ChatRole::Model, text))
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}
