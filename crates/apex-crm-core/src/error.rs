//! Error taxonomy for the entity layer.

use thiserror::Error;

/// Failures raised by [`IndexedEntity`](crate::entity::IndexedEntity) operations.
///
/// Route handlers map these onto HTTP statuses: `NotFound` → 404,
/// `Validation` → 400, `Internal` → 500.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EntityError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for EntityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(anyhow::Error::new(err).context("stored record is not valid JSON"))
    }
}
