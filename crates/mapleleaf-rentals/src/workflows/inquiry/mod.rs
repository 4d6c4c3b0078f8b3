//! Five-step rental inquiry wizard: form state, navigation, document encoding and webhook
//! submission.

pub mod domain;
pub mod encoder;
pub mod router;
pub mod service;
pub mod steps;
pub mod store;
pub mod submission;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    AttachedFile, Bedrooms, DocumentKind, DocumentSlot, DocumentSlots, InquiryState,
    MonthlyBudget, Province, RentalPropertyType,
};
pub use encoder::{EncodeError, FileEncoder};
pub use router::inquiry_router;
pub use service::InquiryIntakeService;
pub use steps::{StepAction, StepController, WizardStep};
pub use store::{FieldKey, FormStateStore, InquiryField};
pub use submission::{render_payload, SubmissionClient, SubmissionPayload, SUBMISSION_SOURCE};
pub use wizard::{InquiryWizard, ResultView, SubmissionReceipt, WizardError};
