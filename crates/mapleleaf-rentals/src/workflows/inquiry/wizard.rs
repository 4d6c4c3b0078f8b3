use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{AttachedFile, DocumentKind, InquiryState};
use super::encoder::{EncodeError, FileEncoder};
use super::steps::{StepAction, StepController, WizardStep};
use super::store::{FieldKey, FormStateStore, InquiryField};
use super::submission::SubmissionClient;
use crate::webhook::{DeliveryOutcome, DeliveryPolicy, WebhookTransport};

/// Details echoed back on the confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub city: String,
    pub email: String,
    pub phone: String,
    pub delivery: DeliveryOutcome,
}

impl SubmissionReceipt {
    pub fn message(&self) -> String {
        format!(
            "Your rental inquiry and documents for {} have been transmitted. \
             We will reach out to {} or {} shortly.",
            self.city, self.email, self.phone
        )
    }
}

/// What the visitor sees outside of the form steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ResultView {
    Editing,
    Submitted(SubmissionReceipt),
    Failed { reason: String },
}

impl ResultView {
    pub fn headline(&self) -> &'static str {
        match self {
            ResultView::Editing => "Rental Inquiry",
            ResultView::Submitted(_) => "Application Sent!",
            ResultView::Failed { .. } => "Submission Failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("submission is only available on the {} step", WizardStep::Contact.title())]
    NotAtTerminalStep,
    #[error("missing or invalid fields: {}", describe_fields(.0))]
    InvalidFields(Vec<FieldKey>),
    #[error("inquiry already submitted; start a new application")]
    AlreadySubmitted,
}

fn describe_fields(fields: &[FieldKey]) -> String {
    fields
        .iter()
        .map(FieldKey::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drives one visitor's inquiry from the first step to the confirmation screen.
///
/// Mutating operations take `&mut self`, so a wizard can never have two submissions in
/// flight at once.
pub struct InquiryWizard<T: ?Sized> {
    store: FormStateStore,
    steps: StepController,
    encoder: FileEncoder,
    client: SubmissionClient<T>,
    policy: DeliveryPolicy,
    view: ResultView,
}

impl<T> InquiryWizard<T>
where
    T: WebhookTransport + ?Sized,
{
    pub fn new(client: SubmissionClient<T>, policy: DeliveryPolicy) -> Self {
        Self {
            store: FormStateStore::new(),
            steps: StepController::new(),
            encoder: FileEncoder,
            client,
            policy,
            view: ResultView::Editing,
        }
    }

    pub fn state(&self) -> &InquiryState {
        self.store.state()
    }

    pub fn step(&self) -> WizardStep {
        self.steps.current()
    }

    pub fn controls(&self) -> Vec<StepAction> {
        self.steps.available_actions()
    }

    pub fn view(&self) -> &ResultView {
        &self.view
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    pub fn set_field(&mut self, field: InquiryField) {
        self.store.set_field(field);
    }

    pub fn toggle_requested_doc(&mut self, kind: DocumentKind) -> bool {
        self.store.toggle_requested_doc(kind)
    }

    /// Reads and attaches a file, or clears the slot when `path` is `None`.
    ///
    /// A read failure is kept on the slot so it can be shown next to the upload control.
    pub async fn attach_document(
        &mut self,
        kind: DocumentKind,
        path: Option<&Path>,
    ) -> Result<(), EncodeError> {
        let Some(path) = path else {
            self.store.set_attachment(kind, None);
            return Ok(());
        };

        match self.encoder.encode_path(path).await {
            Ok(file) => {
                self.store.set_attachment(kind, Some(file));
                Ok(())
            }
            Err(err) => {
                warn!(document = kind.key(), error = %err, "document could not be read");
                self.store.record_document_error(kind, err.to_string());
                Err(err)
            }
        }
    }

    pub fn attach_encoded(&mut self, kind: DocumentKind, file: AttachedFile) {
        self.store.set_attachment(kind, Some(file));
    }

    pub fn next(&mut self) -> WizardStep {
        self.steps.advance()
    }

    pub fn back(&mut self) -> WizardStep {
        self.steps.retreat()
    }

    /// Validates the contact step and posts the inquiry.
    ///
    /// Under [`DeliveryPolicy::BestEffort`] the confirmation is shown whatever the webhook
    /// did. Under [`DeliveryPolicy::Confirmed`] a failed delivery yields
    /// [`ResultView::Failed`] and the answers are kept for another attempt.
    pub async fn submit(&mut self) -> Result<&ResultView, WizardError> {
        if matches!(self.view, ResultView::Submitted(_)) {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.steps.primary_action() != StepAction::Submit {
            return Err(WizardError::NotAtTerminalStep);
        }

        let invalid = self.steps.current().invalid_fields(self.store.state());
        if !invalid.is_empty() {
            return Err(WizardError::InvalidFields(invalid));
        }

        let delivery = self.client.submit(self.store.state()).await;
        self.view = settle(self.policy, self.store.state(), delivery);

        if matches!(self.view, ResultView::Submitted(_)) {
            self.store.reset();
            self.steps.reset();
        }
        Ok(&self.view)
    }

    /// Returns to a blank form on the first step.
    pub fn new_application(&mut self) {
        self.store.reset();
        self.steps.reset();
        self.view = ResultView::Editing;
    }
}

/// Maps a delivery outcome onto the visitor-facing view according to the policy.
pub fn settle(
    policy: DeliveryPolicy,
    inquiry: &InquiryState,
    delivery: DeliveryOutcome,
) -> ResultView {
    match (&delivery, policy) {
        (DeliveryOutcome::Failed(reason), DeliveryPolicy::Confirmed) => {
            warn!(%reason, "inquiry delivery failed");
            ResultView::Failed {
                reason: reason.clone(),
            }
        }
        _ => {
            info!(delivered = delivery.is_delivered(), policy = policy.label(), "inquiry accepted");
            ResultView::Submitted(SubmissionReceipt {
                city: inquiry.city.clone(),
                email: inquiry.email.clone(),
                phone: inquiry.phone.clone(),
                delivery,
            })
        }
    }
}
