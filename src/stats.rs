//! Pipeline and SEO overview.
//!
//! A quick summary of what the store holds: client and lead counts, SEO
//! totals, pipeline value, and the health of open deals. Used by
//! `crm stats`; `GET /api/stats` serves the same numbers as JSON.

use anyhow::Result;

use apex_crm_core::analytics::{self, HealthBand};
use apex_crm_core::models::{Client, Lead};
use apex_crm_core::IndexedEntity;

use crate::config::{Backend, Config};
use crate::db;

/// Run the stats command: load both entity types and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = db::open_store(config).await?;
    let clients = IndexedEntity::<Client>::new(store.clone());
    let leads = IndexedEntity::<Lead>::new(store);
    if config.seed.enabled {
        clients.ensure_seed().await?;
        leads.ensure_seed().await?;
    }
    let stats = analytics::dashboard(&clients.list_all().await?, &leads.list_all().await?);

    println!("Apex CRM Stats");
    println!("==============");
    println!();
    match config.db.backend {
        Backend::Sqlite => {
            let size = std::fs::metadata(&config.db.path)
                .map(|m| m.len())
                .unwrap_or(0);
            println!("  Database:    {}", config.db.path.display());
            println!("  Size:        {}", format_bytes(size));
        }
        Backend::Memory => println!("  Database:    (in memory)"),
    }
    println!();
    println!("  Clients:     {}", stats.total_clients);
    println!("  Keywords:    {}", stats.total_keywords);
    println!("  Clicks:      {}", stats.total_clicks);
    println!("  Avg quality: {:.1}", stats.average_quality_rating);
    println!();
    println!("  Leads:       {}", stats.total_leads);
    println!("  Pipeline:    ${:.0}", stats.total_pipeline_value);
    println!("  Avg deal:    ${:.0}", stats.average_deal_size);
    println!("  Conversion:  {:.1}%", stats.conversion_rate);
    println!("  Win rate:    {:.1}%", stats.win_rate);
    println!(
        "  Health:      {} ({:.0}% engaged)",
        band_label(stats.health.band),
        stats.health.engaged_percentage
    );

    if stats.total_leads > 0 {
        println!();
        println!("  By stage:");
        println!("  {:<16} {:>6} {:>12}", "STAGE", "LEADS", "VALUE");
        println!("  {}", "-".repeat(36));
        for s in &stats.stages {
            println!("  {:<16} {:>6} {:>12.0}", s.stage.as_str(), s.count, s.value);
        }
    }
    println!();
    Ok(())
}

fn band_label(band: HealthBand) -> &'static str {
    match band {
        HealthBand::Healthy => "healthy",
        HealthBand::Warning => "warning",
        HealthBand::Critical => "critical",
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
