//! Pipeline analytics over lead and client snapshots.
//!
//! All rates are percentages in `[0, 100]`. Empty inputs yield zero rather
//! than NaN.

use serde::Serialize;

use crate::models::{Client, Lead, PipelineStage};

/// Won leads as a share of all leads.
pub fn conversion_rate(leads: &[Lead]) -> f64 {
    if leads.is_empty() {
        return 0.0;
    }
    let won = count_stage(leads, PipelineStage::Won);
    won as f64 / leads.len() as f64 * 100.0
}

/// Won leads as a share of closed (won + lost) leads.
pub fn win_rate(leads: &[Lead]) -> f64 {
    let won = count_stage(leads, PipelineStage::Won);
    let closed = won + count_stage(leads, PipelineStage::Lost);
    if closed == 0 {
        return 0.0;
    }
    won as f64 / closed as f64 * 100.0
}

pub fn average_deal_size(leads: &[Lead]) -> f64 {
    if leads.is_empty() {
        return 0.0;
    }
    total_pipeline_value(leads) / leads.len() as f64
}

pub fn total_pipeline_value(leads: &[Lead]) -> f64 {
    leads.iter().map(|l| l.estimated_value).sum()
}

fn count_stage(leads: &[Lead], stage: PipelineStage) -> usize {
    leads.iter().filter(|l| l.stage == stage).count()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub stage: PipelineStage,
    pub count: usize,
    pub value: f64,
}

/// Count and value per stage, in board order, including empty stages.
pub fn stage_distribution(leads: &[Lead]) -> Vec<StageSummary> {
    PipelineStage::ALL
        .into_iter()
        .map(|stage| {
            let in_stage = leads.iter().filter(|l| l.stage == stage);
            StageSummary {
                stage,
                count: in_stage.clone().count(),
                value: in_stage.map(|l| l.estimated_value).sum(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineHealth {
    /// Engaged open leads as a share of all open leads.
    pub engaged_percentage: f64,
    pub band: HealthBand,
}

/// Share of open deals that are past `Lead In`. ≥70% is healthy, 40–70%
/// a warning, below 40% critical.
pub fn pipeline_health(leads: &[Lead]) -> PipelineHealth {
    let open = leads.iter().filter(|l| !l.stage.is_terminal()).count();
    let engaged = leads.iter().filter(|l| l.stage.is_engaged()).count();
    let engaged_percentage = if open > 0 {
        engaged as f64 / open as f64 * 100.0
    } else {
        0.0
    };
    let band = if engaged_percentage >= 70.0 {
        HealthBand::Healthy
    } else if engaged_percentage >= 40.0 {
        HealthBand::Warning
    } else {
        HealthBand::Critical
    };
    PipelineHealth {
        engaged_percentage,
        band,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_clients: usize,
    pub total_leads: usize,
    pub total_keywords: u64,
    pub total_clicks: u64,
    pub average_quality_rating: f64,
    pub total_pipeline_value: f64,
    pub average_deal_size: f64,
    pub conversion_rate: f64,
    pub win_rate: f64,
    pub stages: Vec<StageSummary>,
    pub health: PipelineHealth,
}

pub fn dashboard(clients: &[Client], leads: &[Lead]) -> DashboardStats {
    DashboardStats {
        total_clients: clients.len(),
        total_leads: leads.len(),
        total_keywords: clients.iter().map(|c| c.seo_stats.indexed_keywords).sum(),
        total_clicks: clients.iter().map(|c| c.seo_stats.seo_clicks).sum(),
        average_quality_rating: average_quality_rating(clients),
        total_pipeline_value: total_pipeline_value(leads),
        average_deal_size: average_deal_size(leads),
        conversion_rate: conversion_rate(leads),
        win_rate: win_rate(leads),
        stages: stage_distribution(leads),
        health: pipeline_health(leads),
    }
}

pub fn average_quality_rating(clients: &[Client]) -> f64 {
    if clients.is_empty() {
        return 0.0;
    }
    let sum: u64 = clients
        .iter()
        .map(|c| u64::from(c.seo_stats.website_quality_rating))
        .sum();
    sum as f64 / clients.len() as f64
}
