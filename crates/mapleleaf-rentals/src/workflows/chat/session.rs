use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::debug;

use super::client::ChatClient;
use super::conversation::{ChatMessage, ChatTurn, ConversationStore};
use super::lead::{LeadGate, LeadGateError, LeadInfo, LeadNotifier, LeadTransition};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatSessionError {
    #[error("share your email and phone before chatting")]
    Locked,
    #[error("message text is empty")]
    EmptyMessage,
    #[error("a reply is still pending")]
    ReplyPending,
    #[error(transparent)]
    Lead(#[from] LeadGateError),
    #[error("unknown chat session {0}")]
    UnknownSession(String),
    #[error("reply could not be recorded: {0}")]
    Interrupted(String),
}

impl ChatSessionError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatSessionError::Locked => StatusCode::FORBIDDEN,
            ChatSessionError::EmptyMessage | ChatSessionError::Lead(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ChatSessionError::ReplyPending => StatusCode::CONFLICT,
            ChatSessionError::UnknownSession(_) => StatusCode::NOT_FOUND,
            ChatSessionError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A user message that has been appended and is waiting for the model.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    pub user: ChatMessage,
    /// Conversation as it stood before `user` was appended.
    pub history: Vec<ChatTurn>,
}

/// The two messages one send appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatExchange {
    pub user: ChatMessage,
    pub reply: ChatMessage,
}

/// One visitor's chat widget: lead gate, transcript and completion client.
pub struct ChatSession {
    gate: LeadGate,
    notifier: Arc<dyn LeadNotifier>,
    conversation: ConversationStore,
    client: ChatClient,
}

impl ChatSession {
    pub fn new(client: ChatClient, notifier: Arc<dyn LeadNotifier>) -> Self {
        Self {
            gate: LeadGate::default(),
            notifier,
            conversation: ConversationStore::new(),
            client,
        }
    }

    pub fn lead(&self) -> Option<&LeadInfo> {
        self.gate.lead()
    }

    pub fn is_unlocked(&self) -> bool {
        self.gate.is_unlocked()
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    /// Submits the gate form. The notifier fires only on the transition to unlocked.
    pub fn submit_lead(
        &mut self,
        email: &str,
        phone: &str,
    ) -> Result<LeadTransition, ChatSessionError> {
        let transition = self.gate.submit(email, phone)?;
        if let LeadTransition::Unlocked(lead) = &transition {
            self.notifier.notify(lead);
        }
        Ok(transition)
    }

    /// Appends the visitor's message and raises the loading flag.
    pub fn begin_exchange(&mut self, text: &str) -> Result<PendingExchange, ChatSessionError> {
        if !self.gate.is_unlocked() {
            return Err(ChatSessionError::Locked);
        }
        if text.trim().is_empty() {
            return Err(ChatSessionError::EmptyMessage);
        }
        if self.conversation.is_loading() {
            return Err(ChatSessionError::ReplyPending);
        }

        let history = self.conversation.history();
        let user = self.conversation.append_user(text).clone();
        Ok(PendingExchange { user, history })
    }

    /// Appends the model's reply and clears the loading flag.
    pub fn complete_exchange(&mut self, pending: PendingExchange, reply: String) -> ChatExchange {
        let reply = self.conversation.append_model(reply).clone();
        ChatExchange {
            user: pending.user,
            reply,
        }
    }

    pub async fn send(&mut self, text: &str) -> Result<ChatExchange, ChatSessionError> {
        let pending = self.begin_exchange(text)?;
        debug!(turns = pending.history.len(), "relaying chat message");
        let reply = self.client.send(&pending.history, &pending.user.text).await;
        Ok(self.complete_exchange(pending, reply))
    }
}
