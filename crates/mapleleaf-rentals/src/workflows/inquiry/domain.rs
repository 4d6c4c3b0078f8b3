use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canadian provinces and territories offered in the location step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Province {
    #[serde(rename = "Alberta")]
    Alberta,
    #[serde(rename = "British Columbia")]
    BritishColumbia,
    #[serde(rename = "Manitoba")]
    Manitoba,
    #[serde(rename = "New Brunswick")]
    NewBrunswick,
    #[serde(rename = "Newfoundland and Labrador")]
    NewfoundlandAndLabrador,
    #[serde(rename = "Nova Scotia")]
    NovaScotia,
    #[serde(rename = "Ontario")]
    Ontario,
    #[serde(rename = "Prince Edward Island")]
    PrinceEdwardIsland,
    #[serde(rename = "Quebec")]
    Quebec,
    #[serde(rename = "Saskatchewan")]
    Saskatchewan,
    #[serde(rename = "Northwest Territories")]
    NorthwestTerritories,
    #[serde(rename = "Nunavut")]
    Nunavut,
    #[serde(rename = "Yukon")]
    Yukon,
}

impl Province {
    pub const ALL: [Province; 13] = [
        Province::Alberta,
        Province::BritishColumbia,
        Province::Manitoba,
        Province::NewBrunswick,
        Province::NewfoundlandAndLabrador,
        Province::NovaScotia,
        Province::Ontario,
        Province::PrinceEdwardIsland,
        Province::Quebec,
        Province::Saskatchewan,
        Province::NorthwestTerritories,
        Province::Nunavut,
        Province::Yukon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Province::Alberta => "Alberta",
            Province::BritishColumbia => "British Columbia",
            Province::Manitoba => "Manitoba",
            Province::NewBrunswick => "New Brunswick",
            Province::NewfoundlandAndLabrador => "Newfoundland and Labrador",
            Province::NovaScotia => "Nova Scotia",
            Province::Ontario => "Ontario",
            Province::PrinceEdwardIsland => "Prince Edward Island",
            Province::Quebec => "Quebec",
            Province::Saskatchewan => "Saskatchewan",
            Province::NorthwestTerritories => "Northwest Territories",
            Province::Nunavut => "Nunavut",
            Province::Yukon => "Yukon",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Province::Alberta => "AB",
            Province::BritishColumbia => "BC",
            Province::Manitoba => "MB",
            Province::NewBrunswick => "NB",
            Province::NewfoundlandAndLabrador => "NL",
            Province::NovaScotia => "NS",
            Province::Ontario => "ON",
            Province::PrinceEdwardIsland => "PE",
            Province::Quebec => "QC",
            Province::Saskatchewan => "SK",
            Province::NorthwestTerritories => "NT",
            Province::Nunavut => "NU",
            Province::Yukon => "YT",
        }
    }

    /// Accepts either the full name or the two letter postal code, case-insensitively.
    pub fn lookup(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL.into_iter().find(|province| {
            province.name().eq_ignore_ascii_case(needle)
                || province.code().eq_ignore_ascii_case(needle)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RentalPropertyType {
    #[serde(rename = "Apartment")]
    Apartment,
    #[serde(rename = "Condo")]
    Condo,
    #[serde(rename = "Basement Suite")]
    BasementSuite,
    #[serde(rename = "Detached House")]
    DetachedHouse,
    #[serde(rename = "Townhouse")]
    Townhouse,
    #[serde(rename = "Shared Room")]
    SharedRoom,
}

impl RentalPropertyType {
    pub const ALL: [RentalPropertyType; 6] = [
        RentalPropertyType::Apartment,
        RentalPropertyType::Condo,
        RentalPropertyType::BasementSuite,
        RentalPropertyType::DetachedHouse,
        RentalPropertyType::Townhouse,
        RentalPropertyType::SharedRoom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RentalPropertyType::Apartment => "Apartment",
            RentalPropertyType::Condo => "Condo",
            RentalPropertyType::BasementSuite => "Basement Suite",
            RentalPropertyType::DetachedHouse => "Detached House",
            RentalPropertyType::Townhouse => "Townhouse",
            RentalPropertyType::SharedRoom => "Shared Room",
        }
    }

    pub fn lookup(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Bedrooms {
    #[serde(rename = "Studio")]
    Studio,
    #[default]
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3+")]
    ThreePlus,
}

impl Bedrooms {
    pub const ALL: [Bedrooms; 4] = [
        Bedrooms::Studio,
        Bedrooms::One,
        Bedrooms::Two,
        Bedrooms::ThreePlus,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Bedrooms::Studio => "Studio",
            Bedrooms::One => "1",
            Bedrooms::Two => "2",
            Bedrooms::ThreePlus => "3+",
        }
    }

    pub fn lookup(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL
            .into_iter()
            .find(|count| count.label().eq_ignore_ascii_case(needle))
    }
}

/// Monthly budget from the range slider: [500, 8000] in steps of 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MonthlyBudget(u32);

impl MonthlyBudget {
    pub const MIN: u32 = 500;
    pub const MAX: u32 = 8000;
    pub const STEP: u32 = 100;
    pub const DEFAULT: u32 = 2500;

    /// Clamps into range and rounds to the nearest step, halves rounding up.
    pub fn snapped(raw: i64) -> Self {
        let clamped = raw.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        let step = i64::from(Self::STEP);
        let offset = clamped - i64::from(Self::MIN);
        let rounded = (offset + step / 2) / step * step + i64::from(Self::MIN);
        let bounded = rounded.min(i64::from(Self::MAX));
        Self(u32::try_from(bounded).unwrap_or(Self::DEFAULT))
    }

    pub fn amount(&self) -> u32 {
        self.0
    }
}

impl Default for MonthlyBudget {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl<'de> Deserialize<'de> for MonthlyBudget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        if !raw.is_finite() {
            return Err(serde::de::Error::custom("monthly budget must be a finite number"));
        }
        Ok(Self::snapped(raw.round() as i64))
    }
}

/// The four proofs a renter may attach to an inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Passport,
    WorkPermit,
    EmploymentLetter,
    CreditReport,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Passport,
        DocumentKind::WorkPermit,
        DocumentKind::EmploymentLetter,
        DocumentKind::CreditReport,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DocumentKind::Passport => "passport",
            DocumentKind::WorkPermit => "workPermit",
            DocumentKind::EmploymentLetter => "employmentLetter",
            DocumentKind::CreditReport => "creditReport",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Passport => "Passport",
            DocumentKind::WorkPermit => "Work Permit",
            DocumentKind::EmploymentLetter => "Employment Letter",
            DocumentKind::CreditReport => "Credit Report (CIBIL)",
        }
    }

    pub fn upload_label(&self) -> &'static str {
        match self {
            DocumentKind::Passport => "Passport (ID Page)",
            DocumentKind::WorkPermit => "Work Permit Document",
            DocumentKind::EmploymentLetter => "Employment / Salary Letter",
            DocumentKind::CreditReport => "CIBIL / Equifax / TransUnion Report",
        }
    }

    /// Matches the wire key (`creditReport`) or a kebab/snake spelling (`credit-report`).
    pub fn lookup(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .collect();
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(&normalized))
    }
}

/// A user selected file carried inline as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(rename = "base64")]
    pub content_base64: String,
}

/// Per-document selection, upload and read-failure state.
///
/// `requested` and `attachment` are independent: a file uploaded for a document that is no
/// longer requested is still transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSlot {
    pub requested: bool,
    pub attachment: Option<AttachedFile>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSlots {
    pub passport: DocumentSlot,
    pub work_permit: DocumentSlot,
    pub employment_letter: DocumentSlot,
    pub credit_report: DocumentSlot,
}

impl DocumentSlots {
    pub fn slot(&self, kind: DocumentKind) -> &DocumentSlot {
        match kind {
            DocumentKind::Passport => &self.passport,
            DocumentKind::WorkPermit => &self.work_permit,
            DocumentKind::EmploymentLetter => &self.employment_letter,
            DocumentKind::CreditReport => &self.credit_report,
        }
    }

    pub fn slot_mut(&mut self, kind: DocumentKind) -> &mut DocumentSlot {
        match kind {
            DocumentKind::Passport => &mut self.passport,
            DocumentKind::WorkPermit => &mut self.work_permit,
            DocumentKind::EmploymentLetter => &mut self.employment_letter,
            DocumentKind::CreditReport => &mut self.credit_report,
        }
    }

    pub fn requested(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|kind| self.slot(*kind).requested)
            .collect()
    }

    pub fn attached(&self) -> Vec<(DocumentKind, &AttachedFile)> {
        DocumentKind::ALL
            .into_iter()
            .filter_map(|kind| self.slot(kind).attachment.as_ref().map(|file| (kind, file)))
            .collect()
    }
}

/// Everything the inquiry wizard collects before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "InquiryRecord", into = "InquiryRecord")]
pub struct InquiryState {
    pub province: Option<Province>,
    pub city: String,
    pub property_type: Option<RentalPropertyType>,
    pub monthly_budget: MonthlyBudget,
    pub bedrooms: Bedrooms,
    pub move_in_date: String,
    pub pets: bool,
    pub email: String,
    pub phone: String,
    pub credit_score: String,
    pub documents: DocumentSlots,
}

/// Wire layout of [`InquiryState`]; unset selections travel as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InquiryRecord {
    #[serde(default, with = "blank_as_none")]
    province: Option<Province>,
    #[serde(default)]
    city: String,
    #[serde(default, with = "blank_as_none")]
    property_type: Option<RentalPropertyType>,
    #[serde(default)]
    monthly_budget: MonthlyBudget,
    #[serde(default)]
    bedrooms: Bedrooms,
    #[serde(default)]
    move_in_date: String,
    #[serde(default)]
    pets: bool,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    credit_score: String,
    #[serde(default)]
    requested_docs: RequestedDocsRecord,
    #[serde(default)]
    files: FilesRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestedDocsRecord {
    #[serde(default)]
    passport: bool,
    #[serde(default)]
    work_permit: bool,
    #[serde(default)]
    employment_letter: bool,
    #[serde(default)]
    credit_report: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilesRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    passport: Option<AttachedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    work_permit: Option<AttachedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    employment_letter: Option<AttachedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credit_report: Option<AttachedFile>,
}

fn slot_from_record(requested: bool, attachment: Option<AttachedFile>) -> DocumentSlot {
    DocumentSlot {
        requested,
        attachment,
        error: None,
    }
}

impl From<InquiryRecord> for InquiryState {
    fn from(record: InquiryRecord) -> Self {
        let InquiryRecord {
            province,
            city,
            property_type,
            monthly_budget,
            bedrooms,
            move_in_date,
            pets,
            email,
            phone,
            credit_score,
            requested_docs,
            files,
        } = record;

        Self {
            province,
            city,
            property_type,
            monthly_budget,
            bedrooms,
            move_in_date,
            pets,
            email,
            phone,
            credit_score,
            documents: DocumentSlots {
                passport: slot_from_record(requested_docs.passport, files.passport),
                work_permit: slot_from_record(requested_docs.work_permit, files.work_permit),
                employment_letter: slot_from_record(
                    requested_docs.employment_letter,
                    files.employment_letter,
                ),
                credit_report: slot_from_record(requested_docs.credit_report, files.credit_report),
            },
        }
    }
}

impl From<InquiryState> for InquiryRecord {
    fn from(state: InquiryState) -> Self {
        let DocumentSlots {
            passport,
            work_permit,
            employment_letter,
            credit_report,
        } = state.documents;

        Self {
            province: state.province,
            city: state.city,
            property_type: state.property_type,
            monthly_budget: state.monthly_budget,
            bedrooms: state.bedrooms,
            move_in_date: state.move_in_date,
            pets: state.pets,
            email: state.email,
            phone: state.phone,
            credit_score: state.credit_score,
            requested_docs: RequestedDocsRecord {
                passport: passport.requested,
                work_permit: work_permit.requested,
                employment_letter: employment_letter.requested,
                credit_report: credit_report.requested,
            },
            files: FilesRecord {
                passport: passport.attachment,
                work_permit: work_permit.attachment,
                employment_letter: employment_letter.attachment,
                credit_report: credit_report.attachment,
            },
        }
    }
}

mod blank_as_none {
    use super::*;

    pub(super) fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => {
                let inner: serde::de::value::StrDeserializer<'_, D::Error> =
                    value.as_str().into_deserializer();
                T::deserialize(inner).map(Some)
            }
        }
    }
}
