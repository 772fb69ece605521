//! DB-side row structs and their conversion into domain models.

use permtree_core::models::{Action, OrganizationUnit, Resource, ResourceServer};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

/// Empty scope value standing for "no parent" / "server level".
pub(crate) const NO_SCOPE: &str = "";

pub(crate) fn scope_of(key: Option<&String>) -> String {
    key.cloned().unwrap_or_default()
}

#[derive(Debug, SurrealValue)]
pub(crate) struct ResourceServerRow {
    pub record_key: String,
    pub external_id: String,
    pub name: String,
    pub description: String,
    pub identifier: Option<String>,
    pub ou_id: String,
    pub delimiter: String,
}

impl ResourceServerRow {
    pub fn into_parts(self) -> Result<(String, ResourceServer), DbError> {
        if self.delimiter.chars().count() != 1 {
            return Err(DbError::Malformed {
                entity: "resource_server".into(),
                detail: format!("delimiter {:?} on {}", self.delimiter, self.external_id),
            });
        }
        Ok((
            self.record_key,
            ResourceServer {
                id: self.external_id,
                name: self.name,
                description: self.description,
                identifier: self.identifier,
                organization_unit_id: self.ou_id,
                delimiter: self.delimiter,
            },
        ))
    }
}

#[derive(Debug, SurrealValue)]
pub(crate) struct ResourceRow {
    pub record_key: String,
    pub external_id: String,
    pub parent_external_id: Option<String>,
    pub name: String,
    pub handle: String,
    pub description: String,
    pub permission: String,
}

impl ResourceRow {
    pub fn into_parts(self) -> (String, Resource) {
        (
            self.record_key,
            Resource {
                id: self.external_id,
                name: self.name,
                handle: self.handle,
                description: self.description,
                parent: self.parent_external_id,
                permission: self.permission,
            },
        )
    }
}

#[derive(Debug, SurrealValue)]
pub(crate) struct ActionRow {
    pub external_id: String,
    pub name: String,
    pub handle: String,
    pub description: String,
    pub permission: String,
}

impl From<ActionRow> for Action {
    fn from(row: ActionRow) -> Self {
        Action {
            id: row.external_id,
            name: row.name,
            handle: row.handle,
            description: row.description,
            permission: row.permission,
        }
    }
}

#[derive(Debug, SurrealValue)]
pub(crate) struct OrganizationUnitRow {
    pub record_key: String,
    pub name: String,
    pub handle: String,
}

impl From<OrganizationUnitRow> for OrganizationUnit {
    fn from(row: OrganizationUnitRow) -> Self {
        OrganizationUnit {
            id: row.record_key,
            name: row.name,
            handle: row.handle,
        }
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

pub(crate) fn total_of(rows: &[CountRow]) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}
