//! Action domain model.
//!
//! Actions are verbs attached either directly to a resource server or to
//! one of its resources.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub name: String,
    /// Final permission segment. Immutable.
    pub handle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub permission: String,
}

/// Fields accepted when creating an action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAction {
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
}

/// Fields that can be updated on an existing action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAction {
    pub name: String,
    #[serde(default)]
    pub description: String,
}
