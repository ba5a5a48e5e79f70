//! # Apex CRM Core
//!
//! Storage-agnostic logic for Apex CRM: record models, the [`store::Store`]
//! abstraction, the [`entity::IndexedEntity`] persistence layer, seed data,
//! validation, pipeline analytics, and report aggregation.
//!
//! This crate contains no sqlx, axum, or filesystem I/O. Durable backends
//! live in the `apex-crm` crate and plug in through [`store::Store`].

pub mod analytics;
pub mod entity;
pub mod error;
pub mod models;
pub mod report;
pub mod seed;
pub mod store;
pub mod validate;

pub use entity::{clamp_limit, parse_limit, Entity, IndexedEntity, Page};
pub use error::EntityError;
pub use models::{Client, Lead, PipelineStage};
