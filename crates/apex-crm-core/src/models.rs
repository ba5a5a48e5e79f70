//! Record types stored by Apex CRM.
//!
//! Two record kinds exist: [`Client`] (company metadata plus SEO tracking
//! and uploaded file metadata) and [`Lead`] (a deal moving through the sales
//! pipeline). Both serialize with camelCase field names, which is the shape
//! the HTTP API and the stored JSON share.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::EntityError;
use crate::seed;
use crate::validate;

// ============ Client ============

/// A checklist item on a client's SEO strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicTask {
    pub id: String,
    pub task: String,
    pub completed: bool,
}

/// SEO counters, targets, and the 0–100 website quality rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoStats {
    pub indexed_keywords: u64,
    pub seo_clicks: u64,
    pub strategic_tasks: Vec<StrategicTask>,
    pub competitors: Vec<String>,
    pub long_tail_targets: Vec<String>,
    pub low_keyword_difficulty_targets: Vec<String>,
    pub website_quality_rating: u8,
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Pdf,
    Xml,
    Html,
    Docx,
}

/// Metadata for a file attached to a client. The bytes live elsewhere; `url`
/// points at them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub client_id: String,
    pub file_name: String,
    pub file_type: FileType,
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
    pub url: String,
}

/// Upload request body: everything but the server-assigned `id` and
/// `uploadDate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUploadedFile {
    #[serde(default)]
    pub client_id: Option<String>,
    pub file_name: String,
    pub file_type: FileType,
    pub file_size: u64,
    #[serde(default)]
    pub url: String,
}

impl NewUploadedFile {
    /// Stamp a fresh id and upload time. `client_id` always comes from the
    /// owning client, whatever the request said.
    pub fn into_file(self, client_id: &str) -> UploadedFile {
        UploadedFile {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client_id.to_string(),
            file_name: self.file_name,
            file_type: self.file_type,
            file_size: self.file_size,
            upload_date: Utc::now(),
            url: self.url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub company: String,
    pub contact_person: String,
    pub industry: String,
    pub website: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub seo_stats: SeoStats,
    pub uploaded_files: Vec<UploadedFile>,
}

/// Field-by-field update for a [`Client`]. `None` leaves the field alone;
/// `seoStats` and `uploadedFiles` are replaced wholesale when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    pub company: Option<String>,
    pub contact_person: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub seo_stats: Option<SeoStats>,
    pub uploaded_files: Option<Vec<UploadedFile>>,
}

impl Entity for Client {
    const ENTITY_NAME: &'static str = "client";
    const INDEX_NAME: &'static str = "clients";

    type Patch = ClientPatch;

    fn initial_state() -> Self {
        Self {
            id: String::new(),
            company: String::new(),
            contact_person: String::new(),
            industry: String::new(),
            website: String::new(),
            email: String::new(),
            phone: String::new(),
            created_at: Utc::now(),
            seo_stats: SeoStats::default(),
            uploaded_files: Vec::new(),
        }
    }

    fn seed_data() -> Vec<Self> {
        seed::clients()
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.company
    }

    fn apply_patch(&mut self, patch: ClientPatch) {
        if let Some(v) = patch.company {
            self.company = v;
        }
        if let Some(v) = patch.contact_person {
            self.contact_person = v;
        }
        if let Some(v) = patch.industry {
            self.industry = v;
        }
        if let Some(v) = patch.website {
            self.website = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.phone {
            self.phone = v;
        }
        if let Some(v) = patch.seo_stats {
            self.seo_stats = v;
        }
        if let Some(v) = patch.uploaded_files {
            self.uploaded_files = v;
        }
    }

    fn validate(&self) -> Result<(), EntityError> {
        validate::seo_stats(&self.seo_stats)
    }
}

// ============ Lead ============

/// Sales pipeline stages, in board order. `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    #[serde(rename = "Lead In")]
    LeadIn,
    #[serde(rename = "Contact Made")]
    ContactMade,
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    #[serde(rename = "Negotiation")]
    Negotiation,
    #[serde(rename = "Won")]
    Won,
    #[serde(rename = "Lost")]
    Lost,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::LeadIn,
        PipelineStage::ContactMade,
        PipelineStage::ProposalSent,
        PipelineStage::Negotiation,
        PipelineStage::Won,
        PipelineStage::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::LeadIn => "Lead In",
            PipelineStage::ContactMade => "Contact Made",
            PipelineStage::ProposalSent => "Proposal Sent",
            PipelineStage::Negotiation => "Negotiation",
            PipelineStage::Won => "Won",
            PipelineStage::Lost => "Lost",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Won | PipelineStage::Lost)
    }

    /// Stages that count as actively worked deals for pipeline health.
    pub fn is_engaged(&self) -> bool {
        matches!(
            self,
            PipelineStage::ContactMade | PipelineStage::ProposalSent | PipelineStage::Negotiation
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PipelineStage {
    /// Exact, case-sensitive match against the canonical labels. Used for
    /// wire input; [`FromStr`] is the lenient form for typed CLI input.
    pub fn from_label(label: &str) -> Result<Self, EntityError> {
        PipelineStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == label)
            .ok_or_else(|| unknown_stage(label))
    }
}

fn unknown_stage(s: &str) -> EntityError {
    EntityError::validation(format!(
        "unknown pipeline stage '{}'; expected one of: {}",
        s,
        PipelineStage::ALL.map(|st| st.as_str()).join(", ")
    ))
}

impl FromStr for PipelineStage {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| unknown_stage(s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub company: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub estimated_value: f64,
    pub stage: PipelineStage,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Field-by-field update for a [`Lead`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    pub company: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub estimated_value: Option<f64>,
    pub stage: Option<PipelineStage>,
    pub source: Option<String>,
}

impl LeadPatch {
    pub fn stage(stage: PipelineStage) -> Self {
        Self {
            stage: Some(stage),
            ..Default::default()
        }
    }
}

impl Entity for Lead {
    const ENTITY_NAME: &'static str = "lead";
    const INDEX_NAME: &'static str = "leads";

    type Patch = LeadPatch;

    fn initial_state() -> Self {
        Self {
            id: String::new(),
            company: String::new(),
            contact_person: String::new(),
            email: String::new(),
            phone: String::new(),
            estimated_value: 0.0,
            stage: PipelineStage::LeadIn,
            source: String::new(),
            created_at: Utc::now(),
        }
    }

    fn seed_data() -> Vec<Self> {
        seed::leads()
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.company
    }

    fn apply_patch(&mut self, patch: LeadPatch) {
        if let Some(v) = patch.company {
            self.company = v;
        }
        if let Some(v) = patch.contact_person {
            self.contact_person = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.phone {
            self.phone = v;
        }
        if let Some(v) = patch.estimated_value {
            self.estimated_value = v;
        }
        if let Some(v) = patch.stage {
            self.stage = v;
        }
        if let Some(v) = patch.source {
            self.source = v;
        }
    }

    fn validate(&self) -> Result<(), EntityError> {
        validate::lead_value(self.estimated_value)
    }
}
