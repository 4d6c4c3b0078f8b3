use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::domain::InquiryState;
use crate::webhook::{deliver, DeliveryOutcome, WebhookTransport};

pub const SUBMISSION_SOURCE: &str = "MapleLeaf Rental Web App";
const SUBMISSION_EVENT: &str = "inquiry_submitted";

/// Wire body: the inquiry flattened with a timestamp and source tag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload<'a> {
    #[serde(flatten)]
    pub inquiry: &'a InquiryState,
    pub submitted_at: String,
    pub source: &'static str,
}

impl<'a> SubmissionPayload<'a> {
    pub fn new(inquiry: &'a InquiryState, submitted_at: DateTime<Utc>) -> Self {
        Self {
            inquiry,
            submitted_at: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            source: SUBMISSION_SOURCE,
        }
    }
}

/// Posts finished inquiries to the intake webhook. No retries.
pub struct SubmissionClient<T: ?Sized> {
    transport: Arc<T>,
    endpoint: String,
}

impl<T> SubmissionClient<T>
where
    T: WebhookTransport + ?Sized,
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

    pub async fn submit(&self, inquiry: &InquiryState) -> DeliveryOutcome {
        self.submit_at(inquiry, Utc::now()).await
    }

    pub async fn submit_at(
        &self,
        inquiry: &InquiryState,
        submitted_at: DateTime<Utc>,
    ) -> DeliveryOutcome {
        let body = match serde_json::to_value(SubmissionPayload::new(inquiry, submitted_at)) {
            Ok(body) => body,
            Err(err) => return DeliveryOutcome::Failed(format!("unable to encode inquiry: {err}")),
        };

        info!(
            city = %inquiry.city,
            attachments = inquiry.documents.attached().len(),
            "submitting rental inquiry"
        );
        deliver(self.transport.as_ref(), SUBMISSION_EVENT, &self.endpoint, &body).await
    }
}

impl<T: ?Sized> Clone for SubmissionClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoint: self.endpoint.clone(),
        }
    }
}

/// Convenience for tests and the CLI: the exact JSON that would be posted.
pub fn render_payload(
    inquiry: &InquiryState,
    submitted_at: DateTime<Utc>,
) -> serde_json::Result<Value> {
    serde_json::to_value(SubmissionPayload::new(inquiry, submitted_at))
}
