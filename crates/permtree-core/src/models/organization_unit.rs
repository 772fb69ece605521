//! Organization unit model.
//!
//! Organization units are owned by a separate directory. This crate only
//! needs to know whether one exists, so the model is deliberately small.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationUnit {
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Unique, URL-safe handle (e.g., `engineering`).
    pub handle: String,
}
