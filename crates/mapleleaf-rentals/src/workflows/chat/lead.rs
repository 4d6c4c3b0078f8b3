use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::webhook::{deliver, DeliveryOutcome, WebhookTransport};

pub const LEAD_CAPTURED_EVENT: &str = "chatbot_lead_captured";

/// Contact details a visitor hands over before the assistant opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadInfo {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadGateError {
    #[error("lead form incomplete: {} required", .missing.join(" and "))]
    Incomplete { missing: Vec<&'static str> },
}

/// Result of a successful gate submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadTransition {
    /// The gate opened with this submission; the lead should be announced.
    Unlocked(LeadInfo),
    /// The gate was already open. The original lead is kept.
    AlreadyUnlocked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LeadGate {
    #[default]
    Locked,
    Unlocked(LeadInfo),
}

impl LeadGate {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, LeadGate::Unlocked(_))
    }

    pub fn lead(&self) -> Option<&LeadInfo> {
        match self {
            LeadGate::Locked => None,
            LeadGate::Unlocked(lead) => Some(lead),
        }
    }

    /// Opens the gate when both values are non-empty. Partial submissions leave it locked.
    pub fn submit(&mut self, email: &str, phone: &str) -> Result<LeadTransition, LeadGateError> {
        if self.is_unlocked() {
            return Ok(LeadTransition::AlreadyUnlocked);
        }

        let mut missing = Vec::new();
        if email.is_empty() {
            missing.push("email");
        }
        if phone.is_empty() {
            missing.push("phone");
        }
        if !missing.is_empty() {
            return Err(LeadGateError::Incomplete { missing });
        }

        let lead = LeadInfo {
            email: email.to_string(),
            phone: phone.to_string(),
        };
        *self = LeadGate::Unlocked(lead.clone());
        Ok(LeadTransition::Unlocked(lead))
    }
}

/// Body posted when the chat gate opens.
#[derive(Debug, Clone, Serialize)]
pub struct LeadCapturedEvent<'a> {
    pub event: &'static str,
    pub email: &'a str,
    pub phone: &'a str,
    pub timestamp: String,
}

impl<'a> LeadCapturedEvent<'a> {
    pub fn new(lead: &'a LeadInfo, at: DateTime<Utc>) -> Self {
        Self {
            event: LEAD_CAPTURED_EVENT,
            email: &lead.email,
            phone: &lead.phone,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Fire-and-forget sink for captured leads. Never reports failure to the caller.
pub trait LeadNotifier: Send + Sync {
    fn notify(&self, lead: &LeadInfo);
}

/// Posts lead events to the workflow webhook on a background task.
pub struct WebhookLeadNotifier<T: ?Sized> {
    transport: Arc<T>,
    endpoint: String,
}

impl<T> WebhookLeadNotifier<T>
where
    T: WebhookTransport + ?Sized + 'static,
{
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Performs the POST inline and returns the outcome.
    pub async fn deliver(&self, lead: &LeadInfo) -> DeliveryOutcome {
        post_lead(self.transport.as_ref(), &self.endpoint, lead).await
    }
}

async fn post_lead<T>(transport: &T, endpoint: &str, lead: &LeadInfo) -> DeliveryOutcome
where
    T: WebhookTransport + ?Sized,
{
    let body = match serde_json::to_value(LeadCapturedEvent::new(lead, Utc::now())) {
        Ok(body) => body,
        Err(err) => return DeliveryOutcome::Failed(format!("unable to encode lead: {err}")),
    };
    deliver(transport, LEAD_CAPTURED_EVENT, endpoint, &body).await
}

impl<T> LeadNotifier for WebhookLeadNotifier<T>
where
    T: WebhookTransport + ?Sized + 'static,
{
    fn notify(&self, lead: &LeadInfo) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available; lead notification skipped");
            return;
        };

        info!(email = %lead.email, "chat lead captured");
        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        let lead = lead.clone();
        runtime.spawn(async move {
            // Failures are already logged by `deliver`.
            let _ = post_lead(transport.as_ref(), &endpoint, &lead).await;
        });
    }
}
