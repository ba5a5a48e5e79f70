//! `crm seed`: load the demo dataset into an empty store.
//!
//! Runs regardless of `[seed].enabled`. Entity types that were seeded
//! before, or that already hold records, are left untouched.

use anyhow::Result;

use apex_crm_core::models::{Client, Lead};
use apex_crm_core::IndexedEntity;

use crate::config::Config;
use crate::db;

pub async fn run_seed(config: &Config) -> Result<()> {
    let store = db::open_store(config).await?;
    let clients = IndexedEntity::<Client>::new(store.clone());
    let leads = IndexedEntity::<Lead>::new(store);

    clients.ensure_seed().await?;
    leads.ensure_seed().await?;

    println!("seed");
    println!("  clients: {}", clients.count().await?);
    println!("  leads:   {}", leads.count().await?);
    Ok(())
}
