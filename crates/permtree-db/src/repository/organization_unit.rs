//! SurrealDB implementation of [`OrganizationUnitDirectory`].

use permtree_core::error::StoreResult;
use permtree_core::models::OrganizationUnit;
use permtree_core::repository::OrganizationUnitDirectory;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::rows::OrganizationUnitRow;
use crate::error::DbError;

/// Organization units mirrored into the `organization_unit` table.
///
/// The record key doubles as the unit's public ID.
#[derive(Clone)]
pub struct SurrealOrganizationUnitDirectory<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationUnitDirectory<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Register a unit and return it with a freshly assigned UUIDv7 ID.
    pub async fn create(&self, name: &str, handle: &str) -> StoreResult<OrganizationUnit> {
        let id = Uuid::now_v7().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('organization_unit', $id) SET \
                 name = $name, handle = $handle",
            )
            .bind(("id", id.clone()))
            .bind(("name", name.to_string()))
            .bind(("handle", handle.to_string()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("organization_unit", e))?;

        Ok(OrganizationUnit {
            id,
            name: name.to_string(),
            handle: handle.to_string(),
        })
    }
}

impl<C: Connection> OrganizationUnitDirectory for SurrealOrganizationUnitDirectory<C> {
    async fn get_organization_unit(&self, id: &str) -> StoreResult<OrganizationUnit> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_key, name, handle \
                 FROM type::record('organization_unit', $id)",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationUnitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization_unit".into(),
            id: id.to_string(),
        })?;

        Ok(row.into())
    }
}
