//! SurrealDB implementation of [`HierarchyRepository`].

use std::collections::HashSet;

use permtree_core::error::StoreResult;
use permtree_core::models::{Action, Resource, ResourceServer};
use permtree_core::repository::HierarchyRepository;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::rows::{
    ActionRow, CountRow, NO_SCOPE, ResourceRow, ResourceServerRow, scope_of, total_of,
};
use crate::error::DbError;

/// Maximum depth for ancestor traversal to prevent infinite loops.
const MAX_ANCESTOR_DEPTH: usize = 50;

const SELECT_RESOURCE_SERVER: &str = "SELECT meta::id(id) AS record_key, external_id, name, \
     description, identifier, ou_id, delimiter, created_at FROM resource_server";

const SELECT_RESOURCE: &str = "SELECT meta::id(id) AS record_key, external_id, \
     parent_external_id, name, handle, description, permission, created_at FROM resource";

const SELECT_ACTION: &str =
    "SELECT external_id, name, handle, description, permission, created_at FROM action";

fn new_record_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// SurrealDB implementation of the permission hierarchy store.
///
/// Internal keys are SurrealDB record keys, distinct from the public
/// `external_id` of each row.
#[derive(Clone)]
pub struct SurrealHierarchyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealHierarchyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> HierarchyRepository for SurrealHierarchyRepository<C> {
    type Key = String;

    // -----------------------------------------------------------------------
    // Resource servers
    // -----------------------------------------------------------------------

    async fn create_resource_server(&self, server: &ResourceServer) -> StoreResult<()> {
        let result = self
            .db
            .query(
                "CREATE type::record('resource_server', $key) SET \
                 external_id = $external_id, name = $name, \
                 description = $description, identifier = $identifier, \
                 ou_id = $ou_id, delimiter = $delimiter",
            )
            .bind(("key", new_record_key()))
            .bind(("external_id", server.id.clone()))
            .bind(("name", server.name.clone()))
            .bind(("description", server.description.clone()))
            .bind(("identifier", server.identifier.clone()))
            .bind(("ou_id", server.organization_unit_id.clone()))
            .bind(("delimiter", server.delimiter.clone()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("resource_server", e))?;
        Ok(())
    }

    async fn get_resource_server(&self, id: &str) -> StoreResult<(String, ResourceServer)> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_RESOURCE_SERVER} WHERE external_id = $external_id"
            ))
            .bind(("external_id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceServerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource_server".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_parts()?)
    }

    async fn list_resource_servers(
        &self,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<ResourceServer>> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_RESOURCE_SERVER} ORDER BY created_at DESC, external_id DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceServerRow> = result.take(0).map_err(DbError::from)?;
        let servers = rows
            .into_iter()
            .map(|row| row.into_parts().map(|(_, server)| server))
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(servers)
    }

    async fn count_resource_servers(&self) -> StoreResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM resource_server GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total_of(&rows))
    }

    async fn update_resource_server(&self, server: &ResourceServer) -> StoreResult<()> {
        let result = self
            .db
            .query(
                "UPDATE resource_server SET name = $name, \
                 description = $description, identifier = $identifier, \
                 ou_id = $ou_id, updated_at = time::now() \
                 WHERE external_id = $external_id",
            )
            .bind(("external_id", server.id.clone()))
            .bind(("name", server.name.clone()))
            .bind(("description", server.description.clone()))
            .bind(("identifier", server.identifier.clone()))
            .bind(("ou_id", server.organization_unit_id.clone()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("resource_server", e))?;
        Ok(())
    }

    async fn delete_resource_server(&self, id: &str) -> StoreResult<()> {
        self.db
            .query("DELETE resource_server WHERE external_id = $external_id")
            .bind(("external_id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn resource_server_name_exists(&self, name: &str) -> StoreResult<bool> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM resource_server WHERE name = $name GROUP ALL")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total_of(&rows) > 0)
    }

    async fn resource_server_identifier_exists(&self, identifier: &str) -> StoreResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM resource_server \
                 WHERE identifier = $identifier GROUP ALL",
            )
            .bind(("identifier", identifier.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total_of(&rows) > 0)
    }

    async fn resource_server_has_dependencies(&self, server: &String) -> StoreResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM resource \
                 WHERE server_key = $server_key GROUP ALL; \
                 SELECT count() AS total FROM action \
                 WHERE server_key = $server_key AND resource_scope = $no_scope GROUP ALL;",
            )
            .bind(("server_key", server.clone()))
            .bind(("no_scope", NO_SCOPE.to_string()))
            .await
            .map_err(DbError::from)?;

        let resources: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let actions: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
        Ok(total_of(&resources) + total_of(&actions) > 0)
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    async fn create_resource(
        &self,
        server: &String,
        parent: Option<&String>,
        resource: &Resource,
    ) -> StoreResult<()> {
        let result = self
            .db
            .query(
                "CREATE type::record('resource', $key) SET \
                 external_id = $external_id, server_key = $server_key, \
                 parent_scope = $parent_scope, \
                 parent_external_id = $parent_external_id, \
                 name = $name, handle = $handle, description = $description, \
                 permission = $permission",
            )
            .bind(("key", new_record_key()))
            .bind(("external_id", resource.id.clone()))
            .bind(("server_key", server.clone()))
            .bind(("parent_scope", scope_of(parent)))
            .bind(("parent_external_id", resource.parent.clone()))
            .bind(("name", resource.name.clone()))
            .bind(("handle", resource.handle.clone()))
            .bind(("description", resource.description.clone()))
            .bind(("permission", resource.permission.clone()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("resource", e))?;
        Ok(())
    }

    async fn get_resource(&self, server: &String, id: &str) -> StoreResult<(String, Resource)> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_RESOURCE} WHERE server_key = $server_key \
                 AND external_id = $external_id"
            ))
            .bind(("server_key", server.clone()))
            .bind(("external_id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_parts())
    }

    async fn list_resources(
        &self,
        server: &String,
        parent: Option<&String>,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<Resource>> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_RESOURCE} WHERE server_key = $server_key \
                 AND parent_scope = $parent_scope \
                 ORDER BY created_at DESC, external_id DESC LIMIT $limit START $offset"
            ))
            .bind(("server_key", server.clone()))
            .bind(("parent_scope", scope_of(parent)))
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(|row| row.into_parts().1).collect())
    }

    async fn count_resources(&self, server: &String, parent: Option<&String>) -> StoreResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM resource WHERE server_key = $server_key \
                 AND parent_scope = $parent_scope GROUP ALL",
            )
            .bind(("server_key", server.clone()))
            .bind(("parent_scope", scope_of(parent)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total_of(&rows))
    }

    async fn update_resource(&self, server: &String, resource: &Resource) -> StoreResult<()> {
        self.db
            .query(
                "UPDATE resource SET name = $name, description = $description, \
                 updated_at = time::now() \
                 WHERE server_key = $server_key AND external_id = $external_id",
            )
            .bind(("server_key", server.clone()))
            .bind(("external_id", resource.id.clone()))
            .bind(("name", resource.name.clone()))
            .bind(("description", resource.description.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("resource", e))?;
        Ok(())
    }

    async fn delete_resource(&self, server: &String, id: &str) -> StoreResult<()> {
        self.db
            .query("DELETE resource WHERE server_key = $server_key AND external_id = $external_id")
            .bind(("server_key", server.clone()))
            .bind(("external_id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn resource_handle_exists(
        &self,
        server: &String,
        parent: Option<&String>,
        handle: &str,
    ) -> StoreResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM resource WHERE server_key = $server_key \
                 AND parent_scope = $parent_scope AND handle = $handle GROUP ALL",
            )
            .bind(("server_key", server.clone()))
            .bind(("parent_scope", scope_of(parent)))
            .bind(("handle", handle.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total_of(&rows) > 0)
    }

    async fn resource_has_dependencies(&self, resource: &String) -> StoreResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM resource \
                 WHERE parent_scope = $resource_key GROUP ALL; \
                 SELECT count() AS total FROM action \
                 WHERE resource_scope = $resource_key GROUP ALL;",
            )
            .bind(("resource_key", resource.clone()))
            .await
            .map_err(DbError::from)?;

        let children: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let actions: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
        Ok(total_of(&children) + total_of(&actions) > 0)
    }

    async fn check_circular_dependency(
        &self,
        server: &String,
        resource_id: &str,
        proposed_parent_id: &str,
    ) -> StoreResult<bool> {
        let mut current = Some(proposed_parent_id.to_string());

        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(current_id) = current.take() else {
                return Ok(false);
            };
            if current_id == resource_id {
                return Ok(true);
            }

            current = match self.get_resource(server, &current_id).await {
                Ok((_, ancestor)) => ancestor.parent,
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            };
        }

        Ok(false)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    async fn create_action(
        &self,
        server: &String,
        resource: Option<&String>,
        action: &Action,
    ) -> StoreResult<()> {
        let result = self
            .db
            .query(
                "CREATE type::record('action', $key) SET \
                 external_id = $external_id, server_key = $server_key, \
                 resource_scope = $resource_scope, name = $name, \
                 handle = $handle, description = $description, \
                 permission = $permission",
            )
            .bind(("key", new_record_key()))
            .bind(("external_id", action.id.clone()))
            .bind(("server_key", server.clone()))
            .bind(("resource_scope", scope_of(resource)))
            .bind(("name", action.name.clone()))
            .bind(("handle", action.handle.clone()))
            .bind(("description", action.description.clone()))
            .bind(("permission", action.permission.clone()))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::from_write("action", e))?;
        Ok(())
    }

    async fn get_action(
        &self,
        server: &String,
        resource: Option<&String>,
        id: &str,
    ) -> StoreResult<Action> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_ACTION} WHERE server_key = $server_key \
                 AND resource_scope = $resource_scope AND external_id = $external_id"
            ))
            .bind(("server_key", server.clone()))
            .bind(("resource_scope", scope_of(resource)))
            .bind(("external_id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "action".into(),
            id: id.to_string(),
        })?;
        Ok(row.into())
    }

    async fn list_actions(
        &self,
        server: &String,
        resource: Option<&String>,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<Action>> {
        let mut result = self
            .db
            .query(format!(
                "{SELECT_ACTION} WHERE server_key = $server_key \
                 AND resource_scope = $resource_scope \
                 ORDER BY created_at DESC, external_id DESC LIMIT $limit START $offset"
            ))
            .bind(("server_key", server.clone()))
            .bind(("resource_scope", scope_of(resource)))
            .bind(("limit", limit))
            .bind(("offset", offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Action::from).collect())
    }

    async fn count_actions(&self, server: &String, resource: Option<&String>) -> StoreResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM action WHERE server_key = $server_key \
                 AND resource_scope = $resource_scope GROUP ALL",
            )
            .bind(("server_key", server.clone()))
            .bind(("resource_scope", scope_of(resource)))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total_of(&rows))
    }

    async fn update_action(
        &self,
        server: &String,
        resource: Option<&String>,
        action: &Action,
    ) -> StoreResult<()> {
        self.db
            .query(
                "UPDATE action SET name = $name, description = $description, \
                 updated_at = time::now() \
                 WHERE server_key = $server_key AND resource_scope = $resource_scope \
                 AND external_id = $external_id",
            )
            .bind(("server_key", server.clone()))
            .bind(("resource_scope", scope_of(resource)))
            .bind(("external_id", action.id.clone()))
            .bind(("name", action.name.clone()))
            .bind(("description", action.description.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("action", e))?;
        Ok(())
    }

    async fn delete_action(
        &self,
        server: &String,
        resource: Option<&String>,
        id: &str,
    ) -> StoreResult<()> {
        self.db
            .query(
                "DELETE action WHERE server_key = $server_key \
                 AND resource_scope = $resource_scope AND external_id = $external_id",
            )
            .bind(("server_key", server.clone()))
            .bind(("resource_scope", scope_of(resource)))
            .bind(("external_id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        Ok(())
    }

    async fn action_exists(
        &self,
        server: &String,
        resource: Option<&String>,
        id: &str,
    ) -> StoreResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM action WHERE server_key = $server_key \
                 AND resource_scope = $resource_scope AND external_id = $external_id \
                 GROUP ALL",
            )
            .bind(("server_key", server.clone()))
            .bind(("resource_scope", scope_of(resource)))
            .bind(("external_id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total_of(&rows) > 0)
    }

    async fn action_handle_exists(
        &self,
        server: &String,
        resource: Option<&String>,
        handle: &str,
    ) -> StoreResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM action WHERE server_key = $server_key \
                 AND resource_scope = $resource_scope AND handle = $handle GROUP ALL",
            )
            .bind(("server_key", server.clone()))
            .bind(("resource_scope", scope_of(resource)))
            .bind(("handle", handle.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total_of(&rows) > 0)
    }

    async fn validate_permissions(
        &self,
        server: &String,
        permissions: &[String],
    ) -> StoreResult<Vec<String>> {
        if permissions.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT VALUE permission FROM resource \
                 WHERE server_key = $server_key AND permission IN $permissions; \
                 SELECT VALUE permission FROM action \
                 WHERE server_key = $server_key AND permission IN $permissions;",
            )
            .bind(("server_key", server.clone()))
            .bind(("permissions", permissions.to_vec()))
            .await
            .map_err(DbError::from)?;

        let from_resources: Vec<String> = result.take(0).map_err(DbError::from)?;
        let from_actions: Vec<String> = result.take(1).map_err(DbError::from)?;
        let known: HashSet<String> = from_resources.into_iter().chain(from_actions).collect();

        Ok(permissions
            .iter()
            .filter(|p| !known.contains(*p))
            .cloned()
            .collect())
    }
}
