use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::workflows::chat::client::{ChatClient, ChatCompletion, ChatError};
use crate::workflows::chat::conversation::ChatTurn;
use crate::workflows::chat::lead::{LeadInfo, LeadNotifier};
use crate::workflows::chat::registry::ChatSessionRegistry;
use crate::workflows::chat::session::ChatSession;

pub(super) const TORONTO_QUESTION: &str = "What is average rent in Toronto?";
pub(super) const TORONTO_ANSWER: &str =
    "A one-bedroom in Toronto averages roughly $2,500 per month. This is general information only.";

/// Answers every call with the same text and records what it was asked.
pub(super) struct ScriptedCompletion {
    reply: Result<String, ()>,
    calls: Mutex<Vec<(Vec<ChatTurn>, String)>>,
}

impl ScriptedCompletion {
    pub(super) fn answering(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            reply: Err(()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<(Vec<ChatTurn>, String)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedCompletion {
    async fn complete(&self, history: &[ChatTurn], message: &str) -> Result<String, ChatError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((history.to_vec(), message.to_string()));
        self.reply.clone().map_err(|_| ChatError::EmptyReply)
    }
}

/// Holds each reply until the test releases it.
#[derive(Default)]
pub(super) struct GatedCompletion {
    pub(super) entered: Notify,
    pub(super) release: Notify,
}

#[async_trait]
impl ChatCompletion for GatedCompletion {
    async fn complete(&self, _history: &[ChatTurn], _message: &str) -> Result<String, ChatError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(TORONTO_ANSWER.to_string())
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    leads: Mutex<Vec<LeadInfo>>,
}

impl RecordingNotifier {
    pub(super) fn leads(&self) -> Vec<LeadInfo> {
        self.leads.lock().expect("leads mutex poisoned").clone()
    }
}

impl LeadNotifier for RecordingNotifier {
    fn notify(&self, lead: &LeadInfo) {
        self.leads
            .lock()
            .expect("leads mutex poisoned")
            .push(lead.clone());
    }
}

pub(super) fn session(
    completion: Arc<dyn ChatCompletion>,
    notifier: Arc<RecordingNotifier>,
) -> ChatSession {
    ChatSession::new(ChatClient::new(completion), notifier)
}

pub(super) fn registry(completion: Arc<dyn ChatCompletion>) -> ChatSessionRegistry {
    ChatSessionRegistry::new(
        ChatClient::new(completion),
        Arc::new(RecordingNotifier::default()),
    )
}
