//! Resource domain model.

use serde::{Deserialize, Serialize};

/// A node in a resource server's resource tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    /// Path segment contributed to the permission string. Immutable.
    pub handle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// ID of the parent resource; `None` for a top-level resource. Immutable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Derived at creation from the parent chain and the handle.
    pub permission: String,
}

/// Fields accepted when creating a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateResource {
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Fields that can be updated on an existing resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateResource {
    pub name: String,
    #[serde(default)]
    pub description: String,
}
