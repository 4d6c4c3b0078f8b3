use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::webhook::{DeliveryPolicy, TransportError, WebhookTransport};
use crate::workflows::inquiry::domain::{Bedrooms, Province, RentalPropertyType};
use crate::workflows::inquiry::store::InquiryField;
use crate::workflows::inquiry::submission::SubmissionClient;
use crate::workflows::inquiry::wizard::InquiryWizard;

pub(super) const HOOK_URL: &str = "https://hooks.example.ca/webhook/inquiry";

/// Records every post and answers with a fixed status.
pub(super) struct RecordingTransport {
    status: StatusCode,
    posts: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    pub(super) fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub(super) fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            posts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().expect("posts mutex poisoned").clone()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<StatusCode, TransportError> {
        self.posts
            .lock()
            .expect("posts mutex poisoned")
            .push((url.to_string(), body.clone()));
        Ok(self.status)
    }
}

/// Simulates an unreachable webhook host.
#[derive(Default)]
pub(super) struct OfflineTransport {
    pub(super) attempts: Mutex<usize>,
}

#[async_trait]
impl WebhookTransport for OfflineTransport {
    async fn post_json(&self, _url: &str, _body: &Value) -> Result<StatusCode, TransportError> {
        *self.attempts.lock().expect("attempts mutex poisoned") += 1;
        Err(TransportError::Unreachable(
            "dns error: failed to lookup address information".to_string(),
        ))
    }
}

pub(super) fn wizard<T>(transport: Arc<T>, policy: DeliveryPolicy) -> InquiryWizard<T>
where
    T: WebhookTransport + 'static,
{
    InquiryWizard::new(SubmissionClient::new(transport, HOOK_URL), policy)
}

/// Walks the first three steps with the Toronto condo answers and stops on Documents.
pub(super) fn fill_through_budget<T>(wizard: &mut InquiryWizard<T>)
where
    T: WebhookTransport + ?Sized,
{
    wizard.set_field(InquiryField::Province(Some(Province::Ontario)));
    wizard.set_field(InquiryField::City("Downtown Toronto".to_string()));
    wizard.next();
    wizard.set_field(InquiryField::PropertyType(Some(RentalPropertyType::Condo)));
    wizard.set_field(InquiryField::Bedrooms(Bedrooms::Two));
    wizard.next();
    wizard.set_field(InquiryField::Pets(false));
    wizard.next();
}

pub(super) fn fill_contact<T>(wizard: &mut InquiryWizard<T>)
where
    T: WebhookTransport + ?Sized,
{
    wizard.set_field(InquiryField::MoveInDate("2025-08-01".to_string()));
    wizard.set_field(InquiryField::Email("a@b.ca".to_string()));
    wizard.set_field(InquiryField::Phone("4161234567".to_string()));
}
