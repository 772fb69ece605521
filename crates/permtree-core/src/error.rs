//! Error types for the data-access contract.
//!
//! Stores and collaborators report failures through [`StoreError`]. The
//! hierarchy service turns these into its own client-facing taxonomy and
//! never forwards storage detail to callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness constraint enforced by the store rejected a write.
    /// `field` names the constrained attribute (`name`, `identifier`,
    /// `handle`, `id`).
    #[error("Unique constraint on {entity}.{field} violated: {detail}")]
    Conflict {
        entity: String,
        field: String,
        detail: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be decoded into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// The attribute whose uniqueness was violated, for conflicts only.
    pub fn conflict_field(&self) -> Option<&str> {
        match self {
            Self::Conflict { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure to mint a new opaque identifier.
#[derive(Debug, Error)]
#[error("Identifier generation failed: {0}")]
pub struct IdGenerationError(pub String);
