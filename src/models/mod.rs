//! Data models for proftrack entities.
//!
//! This module defines the core data structures:
//! - `Professor` - A tracked relationship with pipeline status, liaison, and notes
//! - `ProfessorFields` - The writable part of a professor (create/update payload)
//! - `ActivityLog` - An append-only, dated note about an interaction
//! - `NewActivityLog` - The insert payload for an activity log
//!
//! Status, liaison, and engagement are closed enums. Their serialized form is
//! the display label used by the hosted backend (e.g. `"In Contact"`), so an
//! out-of-range value coming back from a store fails deserialization instead
//! of being trusted as a free string.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Label recorded as an activity log's creator when the professor has no liaison.
pub const DEFAULT_CREATED_BY: &str = "Team";

/// Role assigned to newly added professors.
pub const DEFAULT_ROLE: &str = "Professor";

/// Errors raised when input fails validation before reaching a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },
}

/// Lowercase and fold `-`/`_` to spaces so CLI input like `in-contact` matches `In Contact`.
fn normalize_label(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', '_'], " ")
}

/// Pipeline stage of a professor relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PipelineStatus {
    #[default]
    Identified,
    #[serde(rename = "In Contact")]
    InContact,
    #[serde(rename = "First Lead")]
    FirstLead,
    #[serde(rename = "First Client")]
    FirstClient,
}

impl PipelineStatus {
    /// Get all statuses in pipeline order.
    pub fn all() -> &'static [PipelineStatus] {
        &[
            PipelineStatus::Identified,
            PipelineStatus::InContact,
            PipelineStatus::FirstLead,
            PipelineStatus::FirstClient,
        ]
    }

    /// Get the display label (also the stored value).
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Identified => "Identified",
            PipelineStatus::InContact => "In Contact",
            PipelineStatus::FirstLead => "First Lead",
            PipelineStatus::FirstClient => "First Client",
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PipelineStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        PipelineStatus::all()
            .iter()
            .copied()
            .find(|status| normalize_label(status.as_str()) == wanted)
            .ok_or_else(|| ValidationError::InvalidValue {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// Team member responsible for a professor relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Liaison {
    /// No liaison assigned (stored as the empty string)
    #[default]
    #[serde(rename = "")]
    Unassigned,
    #[serde(rename = "MKB")]
    Mkb,
    #[serde(rename = "BB")]
    Bb,
    Vincent,
    Andy,
    Sara,
    Melanie,
    Emily,
    Lorenzo,
    Vanessa,
    Martin,
}

impl Liaison {
    /// Get all liaison values, including `Unassigned`.
    pub fn all() -> &'static [Liaison] {
        &[
            Liaison::Unassigned,
            Liaison::Mkb,
            Liaison::Bb,
            Liaison::Vincent,
            Liaison::Andy,
            Liaison::Sara,
            Liaison::Melanie,
            Liaison::Emily,
            Liaison::Lorenzo,
            Liaison::Vanessa,
            Liaison::Martin,
        ]
    }

    /// Get the stored label. `Unassigned` is the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Liaison::Unassigned => "",
            Liaison::Mkb => "MKB",
            Liaison::Bb => "BB",
            Liaison::Vincent => "Vincent",
            Liaison::Andy => "Andy",
            Liaison::Sara => "Sara",
            Liaison::Melanie => "Melanie",
            Liaison::Emily => "Emily",
            Liaison::Lorenzo => "Lorenzo",
            Liaison::Vanessa => "Vanessa",
            Liaison::Martin => "Martin",
        }
    }

    /// Returns true if a liaison is assigned.
    pub fn is_assigned(&self) -> bool {
        !matches!(self, Liaison::Unassigned)
    }
}

impl fmt::Display for Liaison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liaison::Unassigned => write!(f, "unassigned"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl std::str::FromStr for Liaison {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        if wanted.is_empty() || wanted == "none" || wanted == "unassigned" {
            return Ok(Liaison::Unassigned);
        }
        Liaison::all()
            .iter()
            .copied()
            .find(|liaison| normalize_label(liaison.as_str()) == wanted)
            .ok_or_else(|| ValidationError::InvalidValue {
                kind: "liaison",
                value: s.to_string(),
            })
    }
}

/// How open a professor is to working with the team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngagementType {
    #[default]
    Unknown,
    #[serde(rename = "Hands Off")]
    HandsOff,
    #[serde(rename = "Open to Workshops")]
    OpenToWorkshops,
    #[serde(rename = "Open to Work")]
    OpenToWork,
    #[serde(rename = "Open to be Staffed")]
    OpenToBeStaffed,
}

impl EngagementType {
    /// Get all engagement types.
    pub fn all() -> &'static [EngagementType] {
        &[
            EngagementType::Unknown,
            EngagementType::HandsOff,
            EngagementType::OpenToWorkshops,
            EngagementType::OpenToWork,
            EngagementType::OpenToBeStaffed,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementType::Unknown => "Unknown",
            EngagementType::HandsOff => "Hands Off",
            EngagementType::OpenToWorkshops => "Open to Workshops",
            EngagementType::OpenToWork => "Open to Work",
            EngagementType::OpenToBeStaffed => "Open to be Staffed",
        }
    }
}

impl fmt::Display for EngagementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EngagementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        EngagementType::all()
            .iter()
            .copied()
            .find(|kind| normalize_label(kind.as_str()) == wanted)
            .ok_or_else(|| ValidationError::InvalidValue {
                kind: "engagement type",
                value: s.to_string(),
            })
    }
}

/// Treat missing, null, and blank strings alike.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Key into a professor's fixed set of links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    FacultyPage,
    GoogleScholar,
    Linkedin,
    Other,
}

impl LinkKind {
    pub fn all() -> &'static [LinkKind] {
        &[
            LinkKind::FacultyPage,
            LinkKind::GoogleScholar,
            LinkKind::Linkedin,
            LinkKind::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::FacultyPage => "faculty_page",
            LinkKind::GoogleScholar => "google_scholar",
            LinkKind::Linkedin => "linkedin",
            LinkKind::Other => "other",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LinkKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "faculty page" | "faculty" => Ok(LinkKind::FacultyPage),
            "google scholar" | "scholar" => Ok(LinkKind::GoogleScholar),
            "linkedin" => Ok(LinkKind::Linkedin),
            "other" => Ok(LinkKind::Other),
            _ => Err(ValidationError::InvalidValue {
                kind: "link",
                value: s.to_string(),
            }),
        }
    }
}

/// External profile links for a professor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessorLinks {
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub faculty_page: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub google_scholar: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,

    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

impl ProfessorLinks {
    /// Get the link stored under `kind`.
    pub fn get(&self, kind: LinkKind) -> Option<&str> {
        match kind {
            LinkKind::FacultyPage => self.faculty_page.as_deref(),
            LinkKind::GoogleScholar => self.google_scholar.as_deref(),
            LinkKind::Linkedin => self.linkedin.as_deref(),
            LinkKind::Other => self.other.as_deref(),
        }
    }

    /// Set or clear the link under `kind`. Blank values clear it.
    pub fn set(&mut self, kind: LinkKind, url: Option<String>) {
        let url = url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        match kind {
            LinkKind::FacultyPage => self.faculty_page = url,
            LinkKind::GoogleScholar => self.google_scholar = url,
            LinkKind::Linkedin => self.linkedin = url,
            LinkKind::Other => self.other = url,
        }
    }

    /// Iterate over the links that are set.
    pub fn iter(&self) -> impl Iterator<Item = (LinkKind, &str)> {
        LinkKind::all()
            .iter()
            .filter_map(move |kind| self.get(*kind).map(|url| (*kind, url)))
    }
}

/// One of the ordered string collections on a professor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    /// Core expertise tags
    CoreIp,
    /// Executive-education programs
    ExecEdPrograms,
    /// Client names
    Clients,
}

/// A professor tracked through the outreach pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professor {
    /// Store-assigned identifier
    pub id: String,

    pub name: String,

    pub institution: String,

    #[serde(default)]
    pub role: String,

    /// Core expertise tags, searched by the filter engine
    #[serde(default)]
    pub core_ip: Vec<String>,

    #[serde(default)]
    pub exec_ed_programs: Vec<String>,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub status: PipelineStatus,

    #[serde(default)]
    pub clients: Vec<String>,

    #[serde(default)]
    pub liaison: Liaison,

    #[serde(default)]
    pub next_action: String,

    #[serde(default)]
    pub contract_signed: bool,

    #[serde(default)]
    pub engagement_type: EngagementType,

    #[serde(default)]
    pub links: ProfessorLinks,

    /// Last time anyone logged contact. `None` means never contacted.
    #[serde(default)]
    pub last_contacted: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Professor {
    /// Build a professor from a writable field set plus store-assigned values.
    pub fn from_fields(
        id: String,
        fields: ProfessorFields,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: fields.name,
            institution: fields.institution,
            role: fields.role,
            core_ip: fields.core_ip,
            exec_ed_programs: fields.exec_ed_programs,
            notes: fields.notes,
            status: fields.status,
            clients: fields.clients,
            liaison: fields.liaison,
            next_action: fields.next_action,
            contract_signed: fields.contract_signed,
            engagement_type: fields.engagement_type,
            links: fields.links,
            last_contacted: fields.last_contacted,
            created_at,
            updated_at,
        }
    }

    /// Copy out the writable fields, e.g. as the base of an edit.
    pub fn fields(&self) -> ProfessorFields {
        ProfessorFields {
            name: self.name.clone(),
            institution: self.institution.clone(),
            role: self.role.clone(),
            core_ip: self.core_ip.clone(),
            exec_ed_programs: self.exec_ed_programs.clone(),
            notes: self.notes.clone(),
            status: self.status,
            clients: self.clients.clone(),
            liaison: self.liaison,
            next_action: self.next_action.clone(),
            contract_signed: self.contract_signed,
            engagement_type: self.engagement_type,
            links: self.links.clone(),
            last_contacted: self.last_contacted,
        }
    }
}

/// Writable professor fields: the create payload and the full-record update payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessorFields {
    pub name: String,
    pub institution: String,
    pub role: String,
    pub core_ip: Vec<String>,
    pub exec_ed_programs: Vec<String>,
    pub notes: String,
    pub status: PipelineStatus,
    pub clients: Vec<String>,
    pub liaison: Liaison,
    pub next_action: String,
    pub contract_signed: bool,
    pub engagement_type: EngagementType,
    pub links: ProfessorLinks,
    pub last_contacted: Option<DateTime<Utc>>,
}

impl ProfessorFields {
    /// Create a field set with the required values and everything else defaulted.
    pub fn new(name: impl Into<String>, institution: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            institution: institution.into().trim().to_string(),
            role: DEFAULT_ROLE.to_string(),
            core_ip: Vec::new(),
            exec_ed_programs: Vec::new(),
            notes: String::new(),
            status: PipelineStatus::default(),
            clients: Vec::new(),
            liaison: Liaison::default(),
            next_action: String::new(),
            contract_signed: false,
            engagement_type: EngagementType::default(),
            links: ProfessorLinks::default(),
            last_contacted: None,
        }
    }

    /// Check required fields are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.institution.trim().is_empty() {
            return Err(ValidationError::MissingField("institution"));
        }
        Ok(())
    }

    fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::CoreIp => &mut self.core_ip,
            ListField::ExecEdPrograms => &mut self.exec_ed_programs,
            ListField::Clients => &mut self.clients,
        }
    }

    /// Append a trimmed item to a list field. Blank items are ignored.
    ///
    /// Returns true if the item was added.
    pub fn add_item(&mut self, field: ListField, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.list_mut(field).push(value.to_string());
        true
    }

    /// Remove the item at `index` from a list field.
    pub fn remove_item(&mut self, field: ListField, index: usize) -> Option<String> {
        let list = self.list_mut(field);
        if index < list.len() {
            Some(list.remove(index))
        } else {
            None
        }
    }
}

/// A dated note recording an interaction with a professor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    /// Store-assigned identifier
    pub id: String,

    /// Owning professor
    pub professor_id: String,

    /// Calendar date of the interaction
    pub date: NaiveDate,

    pub entry: String,

    /// Who recorded the entry
    #[serde(default)]
    pub created_by: String,

    pub created_at: DateTime<Utc>,
}

/// Insert payload for an activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivityLog {
    pub professor_id: String,
    pub date: NaiveDate,
    pub entry: String,
    pub created_by: String,
}

impl NewActivityLog {
    /// Create a log payload. The entry is trimmed.
    pub fn new(
        professor_id: impl Into<String>,
        date: NaiveDate,
        entry: &str,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            professor_id: professor_id.into(),
            date,
            entry: entry.trim().to_string(),
            created_by: created_by.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.professor_id.is_empty() {
            return Err(ValidationError::MissingField("professor_id"));
        }
        if self.entry.trim().is_empty() {
            return Err(ValidationError::MissingField("entry"));
        }
        Ok(())
    }
}

/// Default creator label for a log on a professor with the given liaison.
pub fn default_created_by(liaison: Liaison) -> String {
    if liaison.is_assigned() {
        liaison.as_str().to_string()
    } else {
        DEFAULT_CREATED_BY.to_string()
    }
}
