use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_CHAT_SESSION_IDLE_MINUTES;

use super::client::ChatClient;
use super::conversation::ChatMessage;
use super::lead::{LeadInfo, LeadNotifier, LeadTransition};
use super::session::{ChatExchange, ChatSession, ChatSessionError};

/// Serializable snapshot of a session for the widget.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSessionView {
    pub id: String,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<LeadInfo>,
    pub loading: bool,
    pub messages: Vec<ChatMessage>,
}

impl ChatSessionView {
    fn of(id: &str, session: &ChatSession) -> Self {
        Self {
            id: id.to_string(),
            unlocked: session.is_unlocked(),
            lead: session.lead().cloned(),
            loading: session.is_loading(),
            messages: session.messages().to_vec(),
        }
    }
}

struct SessionSlot {
    session: Arc<Mutex<ChatSession>>,
    touched: RwLock<DateTime<Utc>>,
}

impl SessionSlot {
    fn new(session: ChatSession, now: DateTime<Utc>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            touched: RwLock::new(now),
        }
    }

    fn touched(&self) -> DateTime<Utc> {
        match self.touched.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn touch(&self, now: DateTime<Utc>) {
        match self.touched.write() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }
}

/// In-memory chat sessions keyed by `chat-NNNNNN` ids. Nothing is persisted; sessions idle
/// for longer than the configured timeout are dropped when the next one is opened.
pub struct ChatSessionRegistry {
    client: ChatClient,
    notifier: Arc<dyn LeadNotifier>,
    idle_timeout: Duration,
    sequence: AtomicU64,
    sessions: RwLock<BTreeMap<String, Arc<SessionSlot>>>,
}

impl ChatSessionRegistry {
    pub fn new(client: ChatClient, notifier: Arc<dyn LeadNotifier>) -> Self {
        Self {
            client,
            notifier,
            idle_timeout: Duration::minutes(DEFAULT_CHAT_SESSION_IDLE_MINUTES),
            sequence: AtomicU64::new(1),
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn next_id(&self) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("chat-{id:06}")
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create(&self) -> ChatSessionView {
        let now = Utc::now();
        self.evict_idle(now);

        let id = self.next_id();
        let session = ChatSession::new(self.client.clone(), Arc::clone(&self.notifier));
        let view = ChatSessionView::of(&id, &session);

        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.insert(id.clone(), Arc::new(SessionSlot::new(session, now)));
        info!(session = %id, "chat session opened");
        view
    }

    /// Drops every session untouched since `now - idle_timeout`. Returns how many went.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.idle_timeout;
        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = sessions.len();
        sessions.retain(|_, slot| slot.touched() > cutoff);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "idle chat sessions dropped");
        }
        evicted
    }

    /// Removes a session, e.g. when the widget's tab closes.
    pub fn close(&self, id: &str) -> Result<(), ChatSessionError> {
        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match sessions.remove(id) {
            Some(_) => {
                info!(session = %id, "chat session closed");
                Ok(())
            }
            None => Err(ChatSessionError::UnknownSession(id.to_string())),
        }
    }

    fn session(&self, id: &str) -> Result<Arc<Mutex<ChatSession>>, ChatSessionError> {
        let sessions = match self.sessions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slot = sessions
            .get(id)
            .ok_or_else(|| ChatSessionError::UnknownSession(id.to_string()))?;
        slot.touch(Utc::now());
        Ok(Arc::clone(&slot.session))
    }

    pub async fn view(&self, id: &str) -> Result<ChatSessionView, ChatSessionError> {
        let session = self.session(id)?;
        let guard = session.lock().await;
        Ok(ChatSessionView::of(id, &guard))
    }

    pub async fn submit_lead(
        &self,
        id: &str,
        email: &str,
        phone: &str,
    ) -> Result<(LeadTransition, ChatSessionView), ChatSessionError> {
        let session = self.session(id)?;
        let mut guard = session.lock().await;
        let transition = guard.submit_lead(email, phone)?;
        Ok((transition, ChatSessionView::of(id, &guard)))
    }

    /// Relays one message. The session lock is released while the model is answering, so
    /// readers observe the loading flag and a concurrent send is refused as pending.
    ///
    /// Once the user turn is appended the exchange runs on its own task: dropping the
    /// returned future still records exactly one reply and clears the loading flag.
    pub async fn send(&self, id: &str, text: &str) -> Result<ChatExchange, ChatSessionError> {
        let session = self.session(id)?;
        let pending = session.lock().await.begin_exchange(text)?;
        debug!(session = %id, turns = pending.history.len(), "relaying chat message");

        let client = self.client.clone();
        let exchange = tokio::spawn(async move {
            let reply = client.send(&pending.history, &pending.user.text).await;
            session.lock().await.complete_exchange(pending, reply)
        });

        exchange.await.map_err(|err| {
            warn!(session = %id, error = %err, "chat exchange task failed");
            ChatSessionError::Interrupted(err.to_string())
        })
    }
}
