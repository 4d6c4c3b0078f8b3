//! Lead-gated rental assistant: the visitor leaves contact details, then chats with the
//! hosted model. Every send carries the full transcript.

pub mod client;
pub mod conversation;
pub mod lead;
pub mod registry;
pub mod router;
pub mod session;

#[cfg(test)]
mod tests;

pub use client::{
    ChatClient, ChatCompletion, ChatError, GeminiChatClient, FALLBACK_REPLY, SYSTEM_INSTRUCTION,
};
pub use conversation::{ChatMessage, ChatRole, ChatTurn, ConversationStore, GREETING};
pub use lead::{
    LeadCapturedEvent, LeadGate, LeadGateError, LeadInfo, LeadNotifier, LeadTransition,
    WebhookLeadNotifier, LEAD_CAPTURED_EVENT,
};
pub use registry::{ChatSessionRegistry, ChatSessionView};
pub use router::chat_router;
pub use session::{ChatExchange, ChatSession, ChatSessionError, PendingExchange};
