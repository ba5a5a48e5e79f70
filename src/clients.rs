//! `crm clients` commands: page through, inspect, and delete clients.

use anyhow::{bail, Result};

use apex_crm_core::entity::clamp_limit;
use apex_crm_core::models::Client;
use apex_crm_core::IndexedEntity;

use crate::config::Config;
use crate::db;

async fn open(config: &Config) -> Result<IndexedEntity<Client>> {
    let clients = IndexedEntity::<Client>::new(db::open_store(config).await?);
    if config.seed.enabled {
        clients.ensure_seed().await?;
    }
    Ok(clients)
}

/// Print one page of clients and the cursor for the next one.
pub async fn run_list(config: &Config, cursor: Option<&str>, limit: Option<i64>) -> Result<()> {
    let clients = open(config).await?;
    let limit = clamp_limit(
        limit,
        config.pagination.default_limit,
        config.pagination.max_limit,
    );
    let page = clients.list(cursor, limit).await?;

    if page.items.is_empty() {
        println!("No clients.");
        return Ok(());
    }

    println!(
        "{:<38} {:<28} {:<16} {:>9} {:>8}",
        "ID", "COMPANY", "INDUSTRY", "KEYWORDS", "CLICKS"
    );
    for c in &page.items {
        println!(
            "{:<38} {:<28} {:<16} {:>9} {:>8}",
            c.id,
            truncate(&c.company, 28),
            truncate(&c.industry, 16),
            c.seo_stats.indexed_keywords,
            c.seo_stats.seo_clicks
        );
    }
    match &page.next_cursor {
        Some(next) => println!("\nnext cursor: {}", next),
        None => println!("\n(end of list)"),
    }
    Ok(())
}

/// Print a single client with its SEO summary and attached files.
pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let clients = open(config).await?;
    let c = match clients.get_state(id).await {
        Err(err) if err.is_not_found() => bail!("client not found: {}", id),
        other => other?,
    };
    let seo = &c.seo_stats;
    let done = seo.strategic_tasks.iter().filter(|t| t.completed).count();

    println!("{} ({})", c.company, c.id);
    println!("  contact:   {} <{}> {}", c.contact_person, c.email, c.phone);
    println!("  industry:  {}", c.industry);
    println!("  website:   {}", c.website);
    println!("  created:   {}", c.created_at.to_rfc3339());
    println!();
    println!("  keywords:  {}", seo.indexed_keywords);
    println!("  clicks:    {}", seo.seo_clicks);
    println!("  quality:   {}/100", seo.website_quality_rating);
    println!("  tasks:     {}/{} done", done, seo.strategic_tasks.len());
    if !seo.competitors.is_empty() {
        println!("  competitors: {}", seo.competitors.join(", "));
    }
    if !c.uploaded_files.is_empty() {
        println!();
        println!("  files:");
        for f in &c.uploaded_files {
            println!("    {} {} ({} bytes)", f.id, f.file_name, f.file_size);
        }
    }
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let clients = IndexedEntity::<Client>::new(db::open_store(config).await?);
    if !clients.delete(id).await? {
        bail!("client not found: {}", id);
    }
    println!("Deleted client {}", id);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}
