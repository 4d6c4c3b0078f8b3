use serde::Serialize;

use super::domain::{
    AttachedFile, Bedrooms, DocumentKind, InquiryState, MonthlyBudget, Province,
    RentalPropertyType,
};

/// Identifies a scalar field of [`InquiryState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Province,
    City,
    PropertyType,
    MonthlyBudget,
    Bedrooms,
    MoveInDate,
    Pets,
    Email,
    Phone,
    CreditScore,
}

impl FieldKey {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKey::Province => "Province",
            FieldKey::City => "City / Neighbourhood",
            FieldKey::PropertyType => "Property Type",
            FieldKey::MonthlyBudget => "Monthly Budget",
            FieldKey::Bedrooms => "Bedrooms",
            FieldKey::MoveInDate => "Target Move-in Date",
            FieldKey::Pets => "Pet-friendly",
            FieldKey::Email => "Email Address",
            FieldKey::Phone => "Phone Number",
            FieldKey::CreditScore => "Credit Score",
        }
    }
}

/// A replacement value for exactly one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InquiryField {
    Province(Option<Province>),
    City(String),
    PropertyType(Option<RentalPropertyType>),
    /// Raw slider input; stored snapped to the budget grid.
    MonthlyBudget(i64),
    Bedrooms(Bedrooms),
    MoveInDate(String),
    Pets(bool),
    Email(String),
    Phone(String),
    CreditScore(String),
}

impl InquiryField {
    pub fn key(&self) -> FieldKey {
        match self {
            InquiryField::Province(_) => FieldKey::Province,
            InquiryField::City(_) => FieldKey::City,
            InquiryField::PropertyType(_) => FieldKey::PropertyType,
            InquiryField::MonthlyBudget(_) => FieldKey::MonthlyBudget,
            InquiryField::Bedrooms(_) => FieldKey::Bedrooms,
            InquiryField::MoveInDate(_) => FieldKey::MoveInDate,
            InquiryField::Pets(_) => FieldKey::Pets,
            InquiryField::Email(_) => FieldKey::Email,
            InquiryField::Phone(_) => FieldKey::Phone,
            InquiryField::CreditScore(_) => FieldKey::CreditScore,
        }
    }
}

/// In-memory holder for the inquiry being built. Every mutation is synchronous and total.
#[derive(Debug, Clone, Default)]
pub struct FormStateStore {
    state: InquiryState,
}

impl FormStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InquiryState {
        &self.state
    }

    pub fn set_field(&mut self, field: InquiryField) {
        let state = &mut self.state;
        match field {
            InquiryField::Province(value) => state.province = value,
            InquiryField::City(value) => state.city = value,
            InquiryField::PropertyType(value) => state.property_type = value,
            InquiryField::MonthlyBudget(raw) => state.monthly_budget = MonthlyBudget::snapped(raw),
            InquiryField::Bedrooms(value) => state.bedrooms = value,
            InquiryField::MoveInDate(value) => state.move_in_date = value,
            InquiryField::Pets(value) => state.pets = value,
            InquiryField::Email(value) => state.email = value,
            InquiryField::Phone(value) => state.phone = value,
            InquiryField::CreditScore(value) => state.credit_score = value,
        }
    }

    /// Flips the "wants to supply" flag. Any uploaded file is left in place.
    pub fn toggle_requested_doc(&mut self, kind: DocumentKind) -> bool {
        let slot = self.state.documents.slot_mut(kind);
        slot.requested = !slot.requested;
        slot.requested
    }

    /// `None` clears the slot's upload.
    pub fn set_attachment(&mut self, kind: DocumentKind, file: Option<AttachedFile>) {
        let slot = self.state.documents.slot_mut(kind);
        slot.attachment = file;
        slot.error = None;
    }

    pub fn record_document_error(&mut self, kind: DocumentKind, reason: impl Into<String>) {
        let slot = self.state.documents.slot_mut(kind);
        slot.attachment = None;
        slot.error = Some(reason.into());
    }

    pub fn reset(&mut self) {
        self.state = InquiryState::default();
    }

    pub fn replace(&mut self, state: InquiryState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file() -> AttachedFile {
        AttachedFile {
            name: "letter.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            content_base64: "JVBERi0xLjQ=".to_string(),
        }
    }

    #[test]
    fn set_field_replaces_only_the_named_field() {
        let mut store = FormStateStore::new();
        store.set_field(InquiryField::City("Downtown Toronto".to_string()));
        store.set_field(InquiryField::Province(Some(Province::Ontario)));
        store.set_field(InquiryField::Pets(true));

        let state = store.state();
        assert_eq!(state.city, "Downtown Toronto");
        assert_eq!(state.province, Some(Province::Ontario));
        assert!(state.pets);
        assert_eq!(state.monthly_budget.amount(), 2500);
        assert_eq!(state.email, "");
    }

    #[test]
    fn budget_input_is_snapped() {
        let mut store = FormStateStore::new();
        store.set_field(InquiryField::MonthlyBudget(3149));
        assert_eq!(store.state().monthly_budget.amount(), 3100);
        store.set_field(InquiryField::MonthlyBudget(10_000));
        assert_eq!(store.state().monthly_budget.amount(), 8000);
    }

    #[test]
    fn toggling_twice_restores_flag() {
        let mut store = FormStateStore::new();
        for kind in DocumentKind::ALL {
            let original = store.state().documents.slot(kind).requested;
            store.toggle_requested_doc(kind);
            assert_ne!(store.state().documents.slot(kind).requested, original);
            store.toggle_requested_doc(kind);
            assert_eq!(store.state().documents.slot(kind).requested, original);
        }
    }

    #[test]
    fn unrequesting_keeps_uploaded_file() {
        let mut store = FormStateStore::new();
        assert!(store.toggle_requested_doc(DocumentKind::EmploymentLetter));
        store.set_attachment(DocumentKind::EmploymentLetter, Some(sample_file()));
        assert!(!store.toggle_requested_doc(DocumentKind::EmploymentLetter));

        let slot = store.state().documents.slot(DocumentKind::EmploymentLetter);
        assert!(!slot.requested);
        assert_eq!(slot.attachment, Some(sample_file()));
    }

    #[test]
    fn clearing_attachment_removes_entry() {
        let mut store = FormStateStore::new();
        store.set_attachment(DocumentKind::Passport, Some(sample_file()));
        store.set_attachment(DocumentKind::Passport, None);
        assert!(store.state().documents.passport.attachment.is_none());
    }

    #[test]
    fn read_error_replaces_attachment_until_next_upload() {
        let mut store = FormStateStore::new();
        store.set_attachment(DocumentKind::CreditReport, Some(sample_file()));
        store.record_document_error(DocumentKind::CreditReport, "permission denied");

        let slot = store.state().documents.slot(DocumentKind::CreditReport);
        assert!(slot.attachment.is_none());
        assert_eq!(slot.error.as_deref(), Some("permission denied"));

        store.set_attachment(DocumentKind::CreditReport, Some(sample_file()));
        assert!(store.state().documents.credit_report.error.is_none());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut store = FormStateStore::new();
        store.set_field(InquiryField::Email("a@b.ca".to_string()));
        store.toggle_requested_doc(DocumentKind::Passport);
        store.reset();
        assert_eq!(store.state(), &InquiryState::default());
    }
}
