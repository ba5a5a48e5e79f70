//! Report data aggregation.
//!
//! A report request names a report type, the clients (and, for proposals,
//! leads) to include, and the sections to render. This module validates the
//! request, fetches the selected records concurrently, and sums the metrics
//! the renderer displays. Rendering itself happens elsewhere.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, IndexedEntity};
use crate::error::EntityError;
use crate::models::{Client, Lead};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    SeoAudit,
    Proposal,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::SeoAudit => "seo-audit",
            ReportType::Proposal => "proposal",
        }
    }

    pub fn sections(&self) -> &'static [ReportSection] {
        match self {
            ReportType::SeoAudit => &[
                ReportSection::Keywords,
                ReportSection::Tasks,
                ReportSection::Competitors,
                ReportSection::Charts,
                ReportSection::Quality,
            ],
            ReportType::Proposal => &[
                ReportSection::ClientInfo,
                ReportSection::Metrics,
                ReportSection::PipelineValue,
                ReportSection::NextSteps,
            ],
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seo-audit" => Ok(ReportType::SeoAudit),
            "proposal" => Ok(ReportType::Proposal),
            other => Err(EntityError::validation(format!(
                "invalid report type '{}'; expected seo-audit or proposal",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportSection {
    Keywords,
    Tasks,
    Competitors,
    Charts,
    Quality,
    ClientInfo,
    Metrics,
    PipelineValue,
    NextSteps,
}

impl ReportSection {
    const ALL: [ReportSection; 9] = [
        ReportSection::Keywords,
        ReportSection::Tasks,
        ReportSection::Competitors,
        ReportSection::Charts,
        ReportSection::Quality,
        ReportSection::ClientInfo,
        ReportSection::Metrics,
        ReportSection::PipelineValue,
        ReportSection::NextSteps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSection::Keywords => "keywords",
            ReportSection::Tasks => "tasks",
            ReportSection::Competitors => "competitors",
            ReportSection::Charts => "charts",
            ReportSection::Quality => "quality",
            ReportSection::ClientInfo => "clientInfo",
            ReportSection::Metrics => "metrics",
            ReportSection::PipelineValue => "pipelineValue",
            ReportSection::NextSteps => "nextSteps",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

/// Body of `POST /api/reports/data`. Type and sections arrive as strings so
/// bad values surface as validation messages rather than parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(rename = "type", default)]
    pub report_type: String,
    #[serde(default)]
    pub client_ids: Vec<String>,
    #[serde(default)]
    pub lead_ids: Option<Vec<String>>,
    #[serde(default)]
    pub sections: Vec<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReport {
    pub report_type: ReportType,
    pub client_ids: Vec<String>,
    pub lead_ids: Vec<String>,
    pub sections: Vec<ReportSection>,
}

impl ReportRequest {
    pub fn validate(&self) -> Result<ValidReport, EntityError> {
        let report_type: ReportType = self.report_type.parse()?;

        if self.sections.is_empty() {
            return Err(EntityError::validation("Select at least one section"));
        }
        let mut sections = Vec::with_capacity(self.sections.len());
        for raw in &self.sections {
            match ReportSection::parse(raw) {
                Some(section) if report_type.sections().contains(&section) => {
                    if !sections.contains(&section) {
                        sections.push(section);
                    }
                }
                _ => {
                    return Err(EntityError::validation(format!(
                        "invalid section '{}' for {} report",
                        raw, report_type
                    )))
                }
            }
        }

        if self.client_ids.is_empty() {
            return Err(EntityError::validation("Select at least one client"));
        }

        let lead_ids = match report_type {
            ReportType::Proposal => self.lead_ids.clone().unwrap_or_default(),
            ReportType::SeoAudit => Vec::new(),
        };

        Ok(ValidReport {
            report_type,
            client_ids: self.client_ids.clone(),
            lead_ids,
            sections,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub total_keywords: u64,
    pub total_clicks: u64,
    pub total_pipeline_value: f64,
    pub average_quality_rating: f64,
    pub completed_tasks: usize,
    pub total_tasks: usize,
}

impl AggregateMetrics {
    pub fn compute(clients: &[Client], leads: &[Lead]) -> Self {
        let tasks = clients.iter().flat_map(|c| &c.seo_stats.strategic_tasks);
        Self {
            total_keywords: clients.iter().map(|c| c.seo_stats.indexed_keywords).sum(),
            total_clicks: clients.iter().map(|c| c.seo_stats.seo_clicks).sum(),
            total_pipeline_value: crate::analytics::total_pipeline_value(leads),
            average_quality_rating: crate::analytics::average_quality_rating(clients),
            completed_tasks: tasks.clone().filter(|t| t.completed).count(),
            total_tasks: tasks.count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub sections: Vec<ReportSection>,
    pub clients: Vec<Client>,
    pub leads: Vec<Lead>,
    pub aggregate_metrics: AggregateMetrics,
    pub generated_at: DateTime<Utc>,
}

/// Validate `request`, fetch every selected record concurrently, and
/// aggregate. Any missing id fails the whole report with `NotFound`.
pub async fn generate(
    clients: &IndexedEntity<Client>,
    leads: &IndexedEntity<Lead>,
    request: &ReportRequest,
) -> Result<ReportData, EntityError> {
    let report = request.validate()?;

    let selected_clients =
        try_join_all(report.client_ids.iter().map(|id| clients.get_state(id))).await?;
    let selected_leads =
        try_join_all(report.lead_ids.iter().map(|id| leads.get_state(id))).await?;

    let aggregate_metrics = AggregateMetrics::compute(&selected_clients, &selected_leads);

    Ok(ReportData {
        report_type: report.report_type,
        sections: report.sections,
        clients: selected_clients,
        leads: selected_leads,
        aggregate_metrics,
        generated_at: Utc::now(),
    })
}

/// `{id, name}` pair for report pick lists.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOptions {
    pub clients: Vec<ReportOption>,
    pub leads: Vec<ReportOption>,
}

pub fn pick_list<E: Entity>(records: &[E]) -> Vec<ReportOption> {
    records
        .iter()
        .map(|r| ReportOption {
            id: r.id().to_string(),
            name: r.label().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str, clients: &[&str], sections: &[&str]) -> ReportRequest {
        ReportRequest {
            report_type: kind.to_string(),
            client_ids: clients.iter().map(|s| s.to_string()).collect(),
            lead_ids: None,
            sections: sections.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_seo_audit() {
        let valid = request("seo-audit", &["c1"], &["keywords", "quality", "keywords"])
            .validate()
            .unwrap();
        assert_eq!(valid.report_type, ReportType::SeoAudit);
        assert_eq!(
            valid.sections,
            vec![ReportSection::Keywords, ReportSection::Quality]
        );
    }

    #[test]
    fn test_invalid_type() {
        let err = request("invoice", &["c1"], &["keywords"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, EntityError::Validation(_)));
    }

    #[test]
    fn test_section_must_match_type() {
        assert!(request("seo-audit", &["c1"], &["pipelineValue"])
            .validate()
            .is_err());
        assert!(request("proposal", &["c1"], &["pipelineValue"])
            .validate()
            .is_ok());
        assert!(request("proposal", &["c1"], &["bogus"]).validate().is_err());
    }

    #[test]
    fn test_empty_selection_rejected() {
        assert!(request("seo-audit", &[], &["keywords"]).validate().is_err());
        assert!(request("seo-audit", &["c1"], &[]).validate().is_err());
    }

    #[test]
    fn test_lead_ids_ignored_for_seo_audit() {
        let mut req = request("seo-audit", &["c1"], &["tasks"]);
        req.lead_ids = Some(vec!["l1".into()]);
        assert!(req.validate().unwrap().lead_ids.is_empty());

        let mut req = request("proposal", &["c1"], &["metrics"]);
        req.lead_ids = Some(vec!["l1".into()]);
        assert_eq!(req.validate().unwrap().lead_ids, vec!["l1".to_string()]);
    }

    #[test]
    fn test_request_from_json() {
        let req: ReportRequest = serde_json::from_str(
            r#"{"type":"proposal","clientIds":["c1"],"leadIds":["l1"],"sections":["clientInfo"]}"#,
        )
        .unwrap();
        let valid = req.validate().unwrap();
        assert_eq!(valid.report_type, ReportType::Proposal);
        assert_eq!(valid.sections, vec![ReportSection::ClientInfo]);
    }
}
