//! # Apex CRM CLI (`crm`)
//!
//! Administrative interface for the CRM store and the entry point for the
//! HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! crm --config ./config/crm.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `crm init` | Create the SQLite database and run schema migrations |
//! | `crm seed` | Load the demo dataset into an empty store |
//! | `crm clients list` | Print one page of clients |
//! | `crm clients get <id>` | Print a client |
//! | `crm clients delete <id>` | Delete a client |
//! | `crm leads list` | Print the pipeline board |
//! | `crm leads stage <id> <stage>` | Move a lead |
//! | `crm stats` | Pipeline and SEO summary |
//! | `crm serve` | Start the HTTP API |
//!
//! Logs go to stderr and honor `RUST_LOG` (default `info`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apex_crm::config::{self, Backend};
use apex_crm::{clients, leads, migrate, seed_cmd, server, stats};

/// Apex CRM: clients, SEO metrics, and the sales pipeline.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/crm.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "crm", about = "Apex CRM: clients, SEO metrics, and the sales pipeline", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/crm.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it against an existing database is safe.
    Init,

    /// Load demo clients and leads into an empty store.
    Seed,

    /// Inspect and delete clients.
    Clients {
        #[command(subcommand)]
        action: ClientAction,
    },

    /// Inspect the pipeline and move leads between stages.
    Leads {
        #[command(subcommand)]
        action: LeadAction,
    },

    /// Print pipeline and SEO statistics.
    Stats,

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum ClientAction {
    /// Print one page of clients.
    List {
        /// Cursor returned by a previous page.
        #[arg(long)]
        cursor: Option<String>,

        /// Page size, clamped to `[pagination].max_limit`.
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Print a single client.
    Get { id: String },
    /// Delete a client.
    Delete { id: String },
}

#[derive(Subcommand)]
enum LeadAction {
    /// Print all leads grouped by stage.
    List,
    /// Move a lead to another stage (e.g. "Proposal Sent").
    Stage { id: String, stage: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => match cfg.db.backend {
            Backend::Sqlite => {
                migrate::run_migrations(&cfg).await?;
                println!("Database initialized successfully.");
            }
            Backend::Memory => println!("In-memory backend: nothing to initialize."),
        },
        Commands::Seed => seed_cmd::run_seed(&cfg).await?,
        Commands::Clients { action } => match action {
            ClientAction::List { cursor, limit } => {
                clients::run_list(&cfg, cursor.as_deref(), limit).await?;
            }
            ClientAction::Get { id } => clients::run_get(&cfg, &id).await?,
            ClientAction::Delete { id } => clients::run_delete(&cfg, &id).await?,
        },
        Commands::Leads { action } => match action {
            LeadAction::List => leads::run_list(&cfg).await?,
            LeadAction::Stage { id, stage } => leads::run_stage(&cfg, &id, &stage).await?,
        },
        Commands::Stats => stats::run_stats(&cfg).await?,
        Commands::Serve => server::run_server(&cfg).await?,
    }

    Ok(())
}
