//! Outbound workflow webhook plumbing shared by inquiry submission and lead capture.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// How a webhook failure is reflected back to the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// The visitor is shown success once the request has been attempted.
    #[default]
    BestEffort,
    /// Transport errors and non-2xx statuses surface as a failed submission.
    Confirmed,
}

impl DeliveryPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" | "besteffort" => Some(Self::BestEffort),
            "confirmed" | "strict" => Some(Self::Confirmed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BestEffort => "best-effort",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Result of a single webhook POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("webhook unreachable: {0}")]
    Unreachable(String),
}

/// Seam over the HTTP client so submission and lead capture can be exercised offline.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<StatusCode, TransportError>;
}

/// `reqwest` backed transport. Sends `Content-Type: application/json` and ignores the body
/// of the response.
#[derive(Debug, Clone, Default)]
pub struct HttpWebhookTransport {
    client: reqwest::Client,
}

impl HttpWebhookTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhookTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<StatusCode, TransportError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| TransportError::Unreachable(err.to_string()))?;
        Ok(response.status())
    }
}

/// Performs one POST and folds the transport result into a [`DeliveryOutcome`].
///
/// Failures are logged here so callers that discard the outcome still leave a trace.
pub async fn deliver<T>(
    transport: &T,
    event: &'static str,
    url: &str,
    body: &Value,
) -> DeliveryOutcome
where
    T: WebhookTransport + ?Sized,
{
    match transport.post_json(url, body).await {
        Ok(status) if status.is_success() => {
            debug!(event, %status, "webhook delivered");
            DeliveryOutcome::Delivered
        }
        Ok(status) => {
            warn!(event, %status, "webhook rejected payload");
            DeliveryOutcome::Failed(format!("webhook responded with HTTP {}", status.as_u16()))
        }
        Err(err) => {
            warn!(event, error = %err, "webhook delivery failed");
            DeliveryOutcome::Failed(err.to_string())
        }
    }
}
