//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/crm.sqlite"
//! backend = "sqlite"        # or "memory"
//!
//! [server]
//! bind = "127.0.0.1:8787"
//!
//! [pagination]              # optional
//! default_limit = 20
//! max_limit = 100
//!
//! [seed]                    # optional
//! enabled = true
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use apex_crm_core::entity::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Memory,
}

fn default_backend() -> Backend {
    Backend::Sqlite
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_backend")]
    pub backend: Backend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}
fn default_max_limit() -> usize {
    MAX_PAGE_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    /// Populate empty stores with demo records on first read.
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_seed_enabled() -> bool {
    true
}

impl Config {
    /// In-memory configuration with defaults, for tests and throwaway servers.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from(":memory:"),
                backend: Backend::Memory,
            },
            server: ServerConfig {
                bind: "127.0.0.1:8787".to_string(),
            },
            pagination: PaginationConfig::default(),
            seed: SeedConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pagination.max_limit == 0 || self.pagination.max_limit > MAX_PAGE_LIMIT {
            anyhow::bail!("pagination.max_limit must be in [1, {}]", MAX_PAGE_LIMIT);
        }
        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            anyhow::bail!("pagination.default_limit must be in [1, pagination.max_limit]");
        }
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }
        if self.db.backend == Backend::Sqlite && self.db.path.as_os_str().is_empty() {
            anyhow::bail!("db.path must be set when db.backend is 'sqlite'");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
