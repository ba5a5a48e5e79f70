//! `crm leads` commands: the pipeline board and stage moves.

use anyhow::{bail, Result};

use apex_crm_core::models::{Lead, LeadPatch, PipelineStage};
use apex_crm_core::IndexedEntity;

use crate::config::Config;
use crate::db;

/// Print every lead grouped under its pipeline stage, in board order.
pub async fn run_list(config: &Config) -> Result<()> {
    let leads = IndexedEntity::<Lead>::new(db::open_store(config).await?);
    if config.seed.enabled {
        leads.ensure_seed().await?;
    }
    let all = leads.list_all().await?;

    for stage in PipelineStage::ALL {
        let in_stage: Vec<&Lead> = all.iter().filter(|l| l.stage == stage).collect();
        let value: f64 = in_stage.iter().map(|l| l.estimated_value).sum();
        println!("{} ({}, ${:.0})", stage, in_stage.len(), value);
        for l in in_stage {
            println!(
                "  {:<38} {:<28} ${:>10.0}  {}",
                l.id, l.company, l.estimated_value, l.contact_person
            );
        }
        println!();
    }
    Ok(())
}

pub async fn run_stage(config: &Config, id: &str, stage: &str) -> Result<()> {
    let stage: PipelineStage = stage.parse()?;
    let leads = IndexedEntity::<Lead>::new(db::open_store(config).await?);
    let before = match leads.get_state(id).await {
        Err(err) if err.is_not_found() => {
            bail!("no lead with id '{}'; `crm leads list` shows the ids", id)
        }
        other => other?,
    };
    leads.patch(id, LeadPatch::stage(stage)).await?;
    println!("{}: {} -> {}", before.company, before.stage, stage);
    Ok(())
}
