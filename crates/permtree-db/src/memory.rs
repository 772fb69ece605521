//! In-memory implementation of the hierarchy store.
//!
//! Everything lives behind one [`RwLock`], so each contract call observes a
//! consistent snapshot and check-and-insert sequences inside a single call
//! are atomic. Rows are kept in insertion order; list methods walk them
//! newest-first.

use std::collections::{HashMap, HashSet};

use permtree_core::error::{StoreError, StoreResult};
use permtree_core::models::{Action, OrganizationUnit, Resource, ResourceServer};
use permtree_core::repository::{HierarchyRepository, OrganizationUnitDirectory};
use tokio::sync::RwLock;

/// Maximum depth for ancestor traversal to prevent infinite loops.
const MAX_ANCESTOR_DEPTH: usize = 50;

#[derive(Debug, Clone)]
struct StoredServer {
    key: u64,
    server: ResourceServer,
}

#[derive(Debug, Clone)]
struct StoredResource {
    key: u64,
    server_key: u64,
    parent_key: Option<u64>,
    resource: Resource,
}

#[derive(Debug, Clone)]
struct StoredAction {
    server_key: u64,
    resource_key: Option<u64>,
    action: Action,
}

#[derive(Debug, Default)]
struct State {
    next_key: u64,
    servers: Vec<StoredServer>,
    resources: Vec<StoredResource>,
    actions: Vec<StoredAction>,
    organization_units: HashMap<String, OrganizationUnit>,
}

impl State {
    fn allocate_key(&mut self) -> u64 {
        self.next_key += 1;
        self.next_key
    }

    fn find_resource(&self, server_key: u64, id: &str) -> Option<&StoredResource> {
        self.resources
            .iter()
            .find(|r| r.server_key == server_key && r.resource.id == id)
    }

    fn actions_in_scope(
        &self,
        server_key: u64,
        resource_key: Option<u64>,
    ) -> impl DoubleEndedIterator<Item = &StoredAction> {
        self.actions
            .iter()
            .filter(move |a| a.server_key == server_key && a.resource_key == resource_key)
    }

    fn resources_in_scope(
        &self,
        server_key: u64,
        parent_key: Option<u64>,
    ) -> impl DoubleEndedIterator<Item = &StoredResource> {
        self.resources
            .iter()
            .filter(move |r| r.server_key == server_key && r.parent_key == parent_key)
    }
}

fn window(limit: u64, offset: u64) -> (usize, usize) {
    (
        usize::try_from(offset).unwrap_or(usize::MAX),
        usize::try_from(limit).unwrap_or(usize::MAX),
    )
}

fn conflict(entity: &str, field: &str, value: &str) -> StoreError {
    StoreError::Conflict {
        entity: entity.into(),
        field: field.into(),
        detail: format!("{field} {value} already exists"),
    }
}

/// In-memory permission hierarchy store with `u64` keys.
///
/// Also serves as an [`OrganizationUnitDirectory`]; register units with
/// [`MemoryHierarchyStore::add_organization_unit`].
#[derive(Debug, Default)]
pub struct MemoryHierarchyStore {
    state: RwLock<State>,
}

impl MemoryHierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_organization_unit(&self, unit: OrganizationUnit) {
        let mut state = self.state.write().await;
        state.organization_units.insert(unit.id.clone(), unit);
    }
}

impl OrganizationUnitDirectory for MemoryHierarchyStore {
    async fn get_organization_unit(&self, id: &str) -> StoreResult<OrganizationUnit> {
        let state = self.state.read().await;
        state
            .organization_units
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("organization_unit", id))
    }
}

impl HierarchyRepository for MemoryHierarchyStore {
    type Key = u64;

    async fn create_resource_server(&self, server: &ResourceServer) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.servers.iter().any(|s| s.server.id == server.id) {
            return Err(conflict("resource_server", "id", &server.id));
        }
        if state.servers.iter().any(|s| s.server.name == server.name) {
            return Err(conflict("resource_server", "name", &server.name));
        }
        if let Some(identifier) = &server.identifier {
            if state
                .servers
                .iter()
                .any(|s| s.server.identifier.as_ref() == Some(identifier))
            {
                return Err(conflict("resource_server", "identifier", identifier));
            }
        }

        let key = state.allocate_key();
        state.servers.push(StoredServer {
            key,
            server: server.clone(),
        });
        Ok(())
    }

    async fn get_resource_server(&self, id: &str) -> StoreResult<(u64, ResourceServer)> {
        let state = self.state.read().await;
        state
            .servers
            .iter()
            .find(|s| s.server.id == id)
            .map(|s| (s.key, s.server.clone()))
            .ok_or_else(|| StoreError::not_found("resource_server", id))
    }

    async fn list_resource_servers(
        &self,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<ResourceServer>> {
        let (skip, take) = window(limit, offset);
        let state = self.state.read().await;
        Ok(state
            .servers
            .iter()
            .rev()
            .skip(skip)
            .take(take)
            .map(|s| s.server.clone())
            .collect())
    }

    async fn count_resource_servers(&self) -> StoreResult<u64> {
        Ok(self.state.read().await.servers.len() as u64)
    }

    async fn update_resource_server(&self, server: &ResourceServer) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state
            .servers
            .iter()
            .any(|s| s.server.id != server.id && s.server.name == server.name)
        {
            return Err(conflict("resource_server", "name", &server.name));
        }
        if let Some(identifier) = &server.identifier {
            if state.servers.iter().any(|s| {
                s.server.id != server.id && s.server.identifier.as_ref() == Some(identifier)
            }) {
                return Err(conflict("resource_server", "identifier", identifier));
            }
        }

        if let Some(stored) = state.servers.iter_mut().find(|s| s.server.id == server.id) {
            stored.server.name = server.name.clone();
            stored.server.description = server.description.clone();
            stored.server.identifier = server.identifier.clone();
            stored.server.organization_unit_id = server.organization_unit_id.clone();
        }
        Ok(())
    }

    async fn delete_resource_server(&self, id: &str) -> StoreResult<()> {
        self.state.write().await.servers.retain(|s| s.server.id != id);
        Ok(())
    }

    async fn resource_server_name_exists(&self, name: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.servers.iter().any(|s| s.server.name == name))
    }

    async fn resource_server_identifier_exists(&self, identifier: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .servers
            .iter()
            .any(|s| s.server.identifier.as_deref() == Some(identifier)))
    }

    async fn resource_server_has_dependencies(&self, server: &u64) -> StoreResult<bool> {
        let state = self.state.read().await;
        let has_resources = state.resources.iter().any(|r| r.server_key == *server);
        Ok(has_resources || state.actions_in_scope(*server, None).next().is_some())
    }

    async fn create_resource(
        &self,
        server: &u64,
        parent: Option<&u64>,
        resource: &Resource,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let parent_key = parent.copied();
        if state
            .resources_in_scope(*server, parent_key)
            .any(|r| r.resource.handle == resource.handle)
        {
            return Err(conflict("resource", "handle", &resource.handle));
        }

        let key = state.allocate_key();
        state.resources.push(StoredResource {
            key,
            server_key: *server,
            parent_key,
            resource: resource.clone(),
        });
        Ok(())
    }

    async fn get_resource(&self, server: &u64, id: &str) -> StoreResult<(u64, Resource)> {
        let state = self.state.read().await;
        state
            .find_resource(*server, id)
            .map(|r| (r.key, r.resource.clone()))
            .ok_or_else(|| StoreError::not_found("resource", id))
    }

    async fn list_resources(
        &self,
        server: &u64,
        parent: Option<&u64>,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<Resource>> {
        let (skip, take) = window(limit, offset);
        let state = self.state.read().await;
        Ok(state
            .resources_in_scope(*server, parent.copied())
            .rev()
            .skip(skip)
            .take(take)
            .map(|r| r.resource.clone())
            .collect())
    }

    async fn count_resources(&self, server: &u64, parent: Option<&u64>) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state.resources_in_scope(*server, parent.copied()).count() as u64)
    }

    async fn update_resource(&self, server: &u64, resource: &Resource) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(stored) = state
            .resources
            .iter_mut()
            .find(|r| r.server_key == *server && r.resource.id == resource.id)
        {
            stored.resource.name = resource.name.clone();
            stored.resource.description = resource.description.clone();
        }
        Ok(())
    }

    async fn delete_resource(&self, server: &u64, id: &str) -> StoreResult<()> {
        self.state
            .write()
            .await
            .resources
            .retain(|r| !(r.server_key == *server && r.resource.id == id));
        Ok(())
    }

    async fn resource_handle_exists(
        &self,
        server: &u64,
        parent: Option<&u64>,
        handle: &str,
    ) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .resources_in_scope(*server, parent.copied())
            .any(|r| r.resource.handle == handle))
    }

    async fn resource_has_dependencies(&self, resource: &u64) -> StoreResult<bool> {
        let state = self.state.read().await;
        let has_children = state
            .resources
            .iter()
            .any(|r| r.parent_key == Some(*resource));
        let has_actions = state
            .actions
            .iter()
            .any(|a| a.resource_key == Some(*resource));
        Ok(has_children || has_actions)
    }

    async fn check_circular_dependency(
        &self,
        server: &u64,
        resource_id: &str,
        proposed_parent_id: &str,
    ) -> StoreResult<bool> {
        let state = self.state.read().await;
        let mut current = Some(proposed_parent_id.to_string());

        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(current_id) = current.take() else {
                return Ok(false);
            };
            if current_id == resource_id {
                return Ok(true);
            }
            current = state
                .find_resource(*server, &current_id)
                .and_then(|r| r.resource.parent.clone());
        }

        Ok(false)
    }

    async fn create_action(
        &self,
        server: &u64,
        resource: Option<&u64>,
        action: &Action,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state
            .actions_in_scope(*server, resource.copied())
            .any(|a| a.action.handle == action.handle)
        {
            return Err(conflict("action", "handle", &action.handle));
        }

        state.actions.push(StoredAction {
            server_key: *server,
            resource_key: resource.copied(),
            action: action.clone(),
        });
        Ok(())
    }

    async fn get_action(
        &self,
        server: &u64,
        resource: Option<&u64>,
        id: &str,
    ) -> StoreResult<Action> {
        let state = self.state.read().await;
        state
            .actions_in_scope(*server, resource.copied())
            .find(|a| a.action.id == id)
            .map(|a| a.action.clone())
            .ok_or_else(|| StoreError::not_found("action", id))
    }

    async fn list_actions(
        &self,
        server: &u64,
        resource: Option<&u64>,
        limit: u64,
        offset: u64,
    ) -> StoreResult<Vec<Action>> {
        let (skip, take) = window(limit, offset);
        let state = self.state.read().await;
        Ok(state
            .actions_in_scope(*server, resource.copied())
            .rev()
            .skip(skip)
            .take(take)
            .map(|a| a.action.clone())
            .collect())
    }

    async fn count_actions(&self, server: &u64, resource: Option<&u64>) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state.actions_in_scope(*server, resource.copied()).count() as u64)
    }

    async fn update_action(
        &self,
        server: &u64,
        resource: Option<&u64>,
        action: &Action,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(stored) = state.actions.iter_mut().find(|a| {
            a.server_key == *server
                && a.resource_key == resource.copied()
                && a.action.id == action.id
        }) {
            stored.action.name = action.name.clone();
            stored.action.description = action.description.clone();
        }
        Ok(())
    }

    async fn delete_action(&self, server: &u64, resource: Option<&u64>, id: &str) -> StoreResult<()> {
        self.state.write().await.actions.retain(|a| {
            !(a.server_key == *server && a.resource_key == resource.copied() && a.action.id == id)
        });
        Ok(())
    }

    async fn action_exists(&self, server: &u64, resource: Option<&u64>, id: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .actions_in_scope(*server, resource.copied())
            .any(|a| a.action.id == id))
    }

    async fn action_handle_exists(
        &self,
        server: &u64,
        resource: Option<&u64>,
        handle: &str,
    ) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .actions_in_scope(*server, resource.copied())
            .any(|a| a.action.handle == handle))
    }

    async fn validate_permissions(
        &self,
        server: &u64,
        permissions: &[String],
    ) -> StoreResult<Vec<String>> {
        let state = self.state.read().await;
        let known: HashSet<&str> = state
            .resources
            .iter()
            .filter(|r| r.server_key == *server)
            .map(|r| r.resource.permission.as_str())
            .chain(
                state
                    .actions
                    .iter()
                    .filter(|a| a.server_key == *server)
                    .map(|a| a.action.permission.as_str()),
            )
            .collect();

        Ok(permissions
            .iter()
            .filter(|p| !known.contains(p.as_str()))
            .cloned()
            .collect())
    }
}
