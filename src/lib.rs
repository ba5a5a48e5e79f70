//! # Apex CRM
//!
//! Client and sales-pipeline tracking for an SEO agency, served as a JSON
//! API and a small CLI.
//!
//! Records live behind the storage-agnostic [`Store`](apex_crm_core::store::Store)
//! trait. [`apex_crm_core::IndexedEntity`] layers typed create/read/patch/
//! delete and cursor pagination on top; this crate supplies the SQLite
//! backend, configuration, the Axum server, and the `crm` binary.
//!
//! ```text
//! ┌──────────┐   ┌──────────┐
//! │   CLI    │   │   HTTP   │
//! │  (crm)   │   │  (axum)  │
//! └────┬─────┘   └────┬─────┘
//!      └──────┬───────┘
//!             ▼
//!     ┌───────────────┐   ┌──────────────────┐
//!     │ IndexedEntity │──▶│ Store            │
//!     │ Client / Lead │   │ SQLite or memory │
//!     └───────────────┘   └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! crm init                      # create database
//! crm seed                      # load demo clients and leads
//! crm clients list --limit 2
//! crm leads stage lead-1 "Contact Made"
//! crm serve                     # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | SQLite pool and backend selection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `Store` implementation |
//! | [`server`] | HTTP API |
//! | [`clients`], [`leads`], [`stats`], [`seed_cmd`] | CLI commands |

pub mod clients;
pub mod config;
pub mod db;
pub mod leads;
pub mod migrate;
pub mod seed_cmd;
pub mod server;
pub mod sqlite_store;
pub mod stats;

pub use apex_crm_core;
