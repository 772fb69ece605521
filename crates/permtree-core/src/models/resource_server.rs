//! Resource server domain model.
//!
//! A resource server is the top-level namespace of the permission
//! hierarchy. It owns a tree of resources and a set of server-level
//! actions, and fixes the delimiter used to join permission segments.

use serde::{Deserialize, Serialize};

/// An API namespace that scopes resources and actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceServer {
    pub id: String,
    /// Unique across all resource servers.
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Optional external identifier (e.g. an audience URI). Unique when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// The organization unit that owns this resource server.
    #[serde(rename = "ouId")]
    pub organization_unit_id: String,
    /// Single character joining permission segments. Fixed at creation.
    pub delimiter: String,
}

/// Fields accepted when creating a resource server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceServer {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(rename = "ouId")]
    pub organization_unit_id: String,
    /// Falls back to the configured default delimiter when absent.
    #[serde(default)]
    pub delimiter: Option<String>,
}

/// Fields accepted when updating a resource server.
///
/// There is no delimiter here: it cannot change after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceServer {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(rename = "ouId")]
    pub organization_unit_id: String,
}
