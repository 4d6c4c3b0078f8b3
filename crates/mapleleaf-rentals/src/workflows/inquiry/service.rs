use super::domain::InquiryState;
use super::steps::WizardStep;
use super::submission::SubmissionClient;
use super::wizard::{settle, ResultView, WizardError};
use crate::webhook::{DeliveryPolicy, WebhookTransport};

/// One-shot intake for inquiries assembled elsewhere (the browser form posts the whole
/// record at once). Applies the same contact-step checks and policy as [`super::InquiryWizard`].
pub struct InquiryIntakeService<T: ?Sized> {
    client: SubmissionClient<T>,
    policy: DeliveryPolicy,
}

impl<T> InquiryIntakeService<T>
where
    T: WebhookTransport + ?Sized,
{
    pub fn new(client: SubmissionClient<T>, policy: DeliveryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    pub async fn submit(&self, inquiry: InquiryState) -> Result<ResultView, WizardError> {
        let invalid = WizardStep::Contact.invalid_fields(&inquiry);
        if !invalid.is_empty() {
            return Err(WizardError::InvalidFields(invalid));
        }

        let delivery = self.client.submit(&inquiry).await;
        Ok(settle(self.policy, &inquiry, delivery))
    }
}
