use chrono::NaiveDate;
use serde::Serialize;

use super::domain::InquiryState;
use super::store::FieldKey;

/// The five screens of the inquiry wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Location,
    RentalSpecs,
    Budget,
    Documents,
    Contact,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Location,
        WizardStep::RentalSpecs,
        WizardStep::Budget,
        WizardStep::Documents,
        WizardStep::Contact,
    ];

    pub fn index(&self) -> usize {
        match self {
            WizardStep::Location => 0,
            WizardStep::RentalSpecs => 1,
            WizardStep::Budget => 2,
            WizardStep::Documents => 3,
            WizardStep::Contact => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Location => "Location",
            WizardStep::RentalSpecs => "Rental Specs",
            WizardStep::Budget => "Budget",
            WizardStep::Documents => "Documents",
            WizardStep::Contact => "Contact",
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_initial(&self) -> bool {
        self.previous().is_none()
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Scalar fields shown on this step. The documents step edits document slots instead.
    pub fn fields(&self) -> &'static [FieldKey] {
        match self {
            WizardStep::Location => &[FieldKey::Province, FieldKey::City],
            WizardStep::RentalSpecs => &[FieldKey::PropertyType, FieldKey::Bedrooms],
            WizardStep::Budget => &[FieldKey::MonthlyBudget, FieldKey::Pets],
            WizardStep::Documents => &[],
            WizardStep::Contact => &[FieldKey::MoveInDate, FieldKey::Email, FieldKey::Phone],
        }
    }

    /// Fields on this step that would fail browser-side validation when its form is submitted.
    pub fn invalid_fields(&self, state: &InquiryState) -> Vec<FieldKey> {
        self.fields()
            .iter()
            .copied()
            .filter(|field| !field_is_valid(*field, state))
            .collect()
    }
}

fn field_is_valid(field: FieldKey, state: &InquiryState) -> bool {
    match field {
        FieldKey::Province => state.province.is_some(),
        FieldKey::City => !state.city.trim().is_empty(),
        FieldKey::MoveInDate => {
            NaiveDate::parse_from_str(state.move_in_date.trim(), "%Y-%m-%d").is_ok()
        }
        FieldKey::Email => looks_like_email(&state.email),
        FieldKey::Phone => !state.phone.trim().is_empty(),
        FieldKey::PropertyType
        | FieldKey::MonthlyBudget
        | FieldKey::Bedrooms
        | FieldKey::Pets
        | FieldKey::CreditScore => true,
    }
}

fn looks_like_email(raw: &str) -> bool {
    let value = raw.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// What the primary and secondary controls do on the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Next,
    Back,
    Submit,
}

/// Linear navigation over [`WizardStep`]; moves one step at a time and clamps at both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepController {
    current: WizardStep,
}

impl StepController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn advance(&mut self) -> WizardStep {
        if let Some(next) = self.current.next() {
            self.current = next;
        }
        self.current
    }

    pub fn retreat(&mut self) -> WizardStep {
        if let Some(previous) = self.current.previous() {
            self.current = previous;
        }
        self.current
    }

    pub fn reset(&mut self) {
        self.current = WizardStep::default();
    }

    /// The back control is not rendered at all on the first step.
    pub fn back_visible(&self) -> bool {
        !self.current.is_initial()
    }

    /// `Submit` replaces `Next` on the final step.
    pub fn primary_action(&self) -> StepAction {
        if self.current.is_terminal() {
            StepAction::Submit
        } else {
            StepAction::Next
        }
    }

    pub fn available_actions(&self) -> Vec<StepAction> {
        let mut actions = Vec::with_capacity(2);
        if self.back_visible() {
            actions.push(StepAction::Back);
        }
        actions.push(self.primary_action());
        actions
    }
}
