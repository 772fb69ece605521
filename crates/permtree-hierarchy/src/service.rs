//! Hierarchy service: resource server, resource and action management.

use permtree_core::error::StoreError;
use permtree_core::models::{
    Action, CreateAction, CreateResource, CreateResourceServer, Resource, ResourceServer,
    UpdateAction, UpdateResource, UpdateResourceServer,
};
use permtree_core::pagination::{ActionList, ListPage, ResourceList, ResourceServerList};
use permtree_core::permission::derive_permission;
use permtree_core::repository::{HierarchyRepository, IdGenerator, OrganizationUnitDirectory};
use permtree_core::validation::{validate_delimiter, validate_handle, validate_pagination};
use tracing::{debug, error};

use crate::config::HierarchyConfig;
use crate::error::{HierarchyError, HierarchyResult};

/// Logs a store failure and hides it behind [`HierarchyError::Internal`].
fn store_failure(context: &str, err: StoreError) -> HierarchyError {
    error!(error = %err, "{context}");
    HierarchyError::Internal
}

/// Maps a failed write. A unique-index conflict raised by the store means
/// another request won the race past the advisory existence check;
/// `conflict` picks the error kind from the constrained field.
fn write_failure(
    context: &str,
    err: StoreError,
    conflict: impl FnOnce(&str) -> HierarchyError,
) -> HierarchyError {
    match err.conflict_field() {
        Some(field) => {
            debug!(error = %err, field, "{context}: lost uniqueness race");
            conflict(field)
        }
        None => store_failure(context, err),
    }
}

fn resource_server_conflict(field: &str) -> HierarchyError {
    match field {
        "identifier" => HierarchyError::IdentifierConflict,
        _ => HierarchyError::NameConflict,
    }
}

fn handle_conflict(_field: &str) -> HierarchyError {
    HierarchyError::HandleConflict
}

fn require_name_and_handle(name: &str, handle: &str, delimiter: &str) -> HierarchyResult<()> {
    if name.is_empty() || handle.is_empty() {
        return Err(HierarchyError::InvalidRequestFormat);
    }
    validate_handle(handle, delimiter)?;
    Ok(())
}

/// Manages the permission hierarchy.
///
/// Generic over the store, the organization-unit directory and the ID
/// source so that this crate has no dependency on a storage engine.
pub struct HierarchyService<R, O, G> {
    repo: R,
    organization_units: O,
    ids: G,
    config: HierarchyConfig,
}

impl<R, O, G> HierarchyService<R, O, G>
where
    R: HierarchyRepository,
    O: OrganizationUnitDirectory,
    G: IdGenerator,
{
    /// Fails with [`HierarchyError::Configuration`] when `config` is unusable.
    pub fn new(
        repo: R,
        organization_units: O,
        ids: G,
        config: HierarchyConfig,
    ) -> HierarchyResult<Self> {
        config.validate()?;
        Ok(Self {
            repo,
            organization_units,
            ids,
            config,
        })
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn default_page_size(&self) -> u64 {
        self.config.default_page_size
    }

    fn check_pagination(&self, limit: i64, offset: i64) -> HierarchyResult<(u64, u64)> {
        validate_pagination(limit, offset, self.config.max_page_size)?;
        Ok((limit as u64, offset as u64))
    }

    fn generate_id(&self) -> HierarchyResult<String> {
        self.ids.generate().map_err(|e| {
            error!(error = %e, "Failed to generate id");
            HierarchyError::Internal
        })
    }

    async fn ensure_organization_unit(&self, id: &str) -> HierarchyResult<()> {
        match self.organization_units.get_organization_unit(id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(organization_unit_id = %id, "Organization unit not found");
                Err(HierarchyError::OrganizationUnitNotFound)
            }
            Err(e) => Err(store_failure("Failed to validate organization unit", e)),
        }
    }

    async fn resolve_resource_server(&self, id: &str) -> HierarchyResult<(R::Key, ResourceServer)> {
        match self.repo.get_resource_server(id).await {
            Ok(found) => Ok(found),
            Err(e) if e.is_not_found() => {
                debug!(resource_server_id = %id, "Resource server not found");
                Err(HierarchyError::ResourceServerNotFound)
            }
            Err(e) => Err(store_failure("Failed to get resource server", e)),
        }
    }

    /// Looks `id` up inside one server; `not_found` is returned when absent.
    async fn resolve_resource(
        &self,
        server: &R::Key,
        id: &str,
        not_found: HierarchyError,
    ) -> HierarchyResult<(R::Key, Resource)> {
        match self.repo.get_resource(server, id).await {
            Ok(found) => Ok(found),
            Err(e) if e.is_not_found() => {
                debug!(resource_id = %id, "Resource not found");
                Err(not_found)
            }
            Err(e) => Err(store_failure("Failed to get resource", e)),
        }
    }

    /// Resolves the optional resource that scopes an action.
    async fn resolve_action_scope(
        &self,
        server: &R::Key,
        resource_id: Option<&str>,
    ) -> HierarchyResult<Option<(R::Key, Resource)>> {
        match resource_id {
            Some(id) => Ok(Some(
                self.resolve_resource(server, id, HierarchyError::ResourceNotFound)
                    .await?,
            )),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Resource servers
    // -----------------------------------------------------------------------

    pub async fn create_resource_server(
        &self,
        input: CreateResourceServer,
    ) -> HierarchyResult<ResourceServer> {
        debug!(name = %input.name, "Creating resource server");

        if input.name.is_empty() || input.organization_unit_id.is_empty() {
            return Err(HierarchyError::InvalidRequestFormat);
        }
        let delimiter = match input.delimiter.filter(|d| !d.is_empty()) {
            Some(delimiter) => {
                validate_delimiter(&delimiter)?;
                delimiter
            }
            None => self.config.default_delimiter.clone(),
        };
        let identifier = input.identifier.filter(|i| !i.is_empty());

        self.ensure_organization_unit(&input.organization_unit_id)
            .await?;

        let name_exists = self
            .repo
            .resource_server_name_exists(&input.name)
            .await
            .map_err(|e| store_failure("Failed to check resource server name", e))?;
        if name_exists {
            debug!(name = %input.name, "Resource server name already exists");
            return Err(HierarchyError::NameConflict);
        }

        if let Some(identifier) = &identifier {
            let identifier_exists = self
                .repo
                .resource_server_identifier_exists(identifier)
                .await
                .map_err(|e| store_failure("Failed to check resource server identifier", e))?;
            if identifier_exists {
                debug!(identifier = %identifier, "Resource server identifier already exists");
                return Err(HierarchyError::IdentifierConflict);
            }
        }

        let server = ResourceServer {
            id: self.generate_id()?,
            name: input.name,
            description: input.description,
            identifier,
            organization_unit_id: input.organization_unit_id,
            delimiter,
        };

        self.repo
            .create_resource_server(&server)
            .await
            .map_err(|e| {
                write_failure("Failed to create resource server", e, resource_server_conflict)
            })?;

        debug!(resource_server_id = %server.id, "Created resource server");
        Ok(server)
    }

    pub async fn get_resource_server(&self, id: &str) -> HierarchyResult<ResourceServer> {
        if id.is_empty() {
            return Err(HierarchyError::MissingId);
        }
        let (_, server) = self.resolve_resource_server(id).await?;
        Ok(server)
    }

    pub async fn list_resource_servers(
        &self,
        limit: i64,
        offset: i64,
    ) -> HierarchyResult<ResourceServerList> {
        let (limit, offset) = self.check_pagination(limit, offset)?;

        let total = self
            .repo
            .count_resource_servers()
            .await
            .map_err(|e| store_failure("Failed to count resource servers", e))?;
        let servers = self
            .repo
            .list_resource_servers(limit, offset)
            .await
            .map_err(|e| store_failure("Failed to list resource servers", e))?;

        Ok(ListPage::new("/resource-servers", servers, total, limit, offset))
    }

    /// Replaces the mutable fields. The delimiter always stays as created.
    pub async fn update_resource_server(
        &self,
        id: &str,
        input: UpdateResourceServer,
    ) -> HierarchyResult<ResourceServer> {
        if id.is_empty() {
            return Err(HierarchyError::MissingId);
        }
        if input.name.is_empty() || input.organization_unit_id.is_empty() {
            return Err(HierarchyError::InvalidRequestFormat);
        }

        let (_, existing) = self.resolve_resource_server(id).await?;

        self.ensure_organization_unit(&input.organization_unit_id)
            .await?;

        if existing.name != input.name {
            let name_exists = self
                .repo
                .resource_server_name_exists(&input.name)
                .await
                .map_err(|e| store_failure("Failed to check resource server name", e))?;
            if name_exists {
                return Err(HierarchyError::NameConflict);
            }
        }

        let identifier = input.identifier.filter(|i| !i.is_empty());
        if let Some(identifier) = identifier.as_ref().filter(|i| existing.identifier.as_ref() != Some(*i)) {
            let identifier_exists = self
                .repo
                .resource_server_identifier_exists(identifier)
                .await
                .map_err(|e| store_failure("Failed to check resource server identifier", e))?;
            if identifier_exists {
                debug!(identifier = %identifier, "Resource server identifier already exists");
                return Err(HierarchyError::IdentifierConflict);
            }
        }

        let updated = ResourceServer {
            id: existing.id,
            name: input.name,
            description: input.description,
            identifier,
            organization_unit_id: input.organization_unit_id,
            delimiter: existing.delimiter,
        };

        self.repo
            .update_resource_server(&updated)
            .await
            .map_err(|e| {
                write_failure("Failed to update resource server", e, resource_server_conflict)
            })?;

        Ok(updated)
    }

    /// Succeeds when the server does not exist.
    pub async fn delete_resource_server(&self, id: &str) -> HierarchyResult<()> {
        if id.is_empty() {
            return Err(HierarchyError::MissingId);
        }

        let server_key = match self.repo.get_resource_server(id).await {
            Ok((key, _)) => key,
            Err(e) if e.is_not_found() => {
                debug!(resource_server_id = %id, "Resource server already absent");
                return Ok(());
            }
            Err(e) => return Err(store_failure("Failed to check resource server existence", e)),
        };

        let has_dependencies = self
            .repo
            .resource_server_has_dependencies(&server_key)
            .await
            .map_err(|e| store_failure("Failed to check dependencies", e))?;
        if has_dependencies {
            debug!(resource_server_id = %id, "Resource server has dependencies");
            return Err(HierarchyError::CannotDelete);
        }

        self.repo
            .delete_resource_server(id)
            .await
            .map_err(|e| store_failure("Failed to delete resource server", e))
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    pub async fn create_resource(
        &self,
        resource_server_id: &str,
        input: CreateResource,
    ) -> HierarchyResult<Resource> {
        let (server_key, server) = self.resolve_resource_server(resource_server_id).await?;

        require_name_and_handle(&input.name, &input.handle, &server.delimiter)?;

        let parent = match input.parent.as_deref() {
            Some(parent_id) => Some(
                self.resolve_resource(
                    &server_key,
                    parent_id,
                    HierarchyError::ParentResourceNotFound,
                )
                .await?,
            ),
            None => None,
        };
        let parent_key = parent.as_ref().map(|(key, _)| key);

        let handle_exists = self
            .repo
            .resource_handle_exists(&server_key, parent_key, &input.handle)
            .await
            .map_err(|e| store_failure("Failed to check resource handle", e))?;
        if handle_exists {
            debug!(handle = %input.handle, "Resource handle already exists under parent");
            return Err(HierarchyError::HandleConflict);
        }

        let permission = derive_permission(
            &server,
            parent.as_ref().map(|(_, resource)| resource),
            &input.handle,
        );

        let resource = Resource {
            id: self.generate_id()?,
            name: input.name,
            handle: input.handle,
            description: input.description,
            parent: input.parent,
            permission,
        };

        self.repo
            .create_resource(&server_key, parent_key, &resource)
            .await
            .map_err(|e| write_failure("Failed to create resource", e, handle_conflict))?;

        debug!(
            resource_server_id = %resource_server_id,
            resource_id = %resource.id,
            permission = %resource.permission,
            "Created resource"
        );
        Ok(resource)
    }

    pub async fn get_resource(
        &self,
        resource_server_id: &str,
        id: &str,
    ) -> HierarchyResult<Resource> {
        if id.is_empty() || resource_server_id.is_empty() {
            return Err(HierarchyError::MissingId);
        }

        let (server_key, _) = self.resolve_resource_server(resource_server_id).await?;
        let (_, resource) = self
            .resolve_resource(&server_key, id, HierarchyError::ResourceNotFound)
            .await?;
        Ok(resource)
    }

    /// Lists the children of `parent_id`, or top-level resources when it is
    /// `None`. `Some("")` is looked up like any other ID.
    pub async fn list_resources(
        &self,
        resource_server_id: &str,
        parent_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> HierarchyResult<ResourceList> {
        let (limit, offset) = self.check_pagination(limit, offset)?;
        if resource_server_id.is_empty() {
            return Err(HierarchyError::MissingId);
        }

        let (server_key, _) = self.resolve_resource_server(resource_server_id).await?;

        let parent_key = match parent_id {
            Some(parent_id) => Some(
                self.resolve_resource(&server_key, parent_id, HierarchyError::ResourceNotFound)
                    .await?
                    .0,
            ),
            None => None,
        };

        let total = self
            .repo
            .count_resources(&server_key, parent_key.as_ref())
            .await
            .map_err(|e| store_failure("Failed to count resources", e))?;
        let resources = self
            .repo
            .list_resources(&server_key, parent_key.as_ref(), limit, offset)
            .await
            .map_err(|e| store_failure("Failed to list resources", e))?;

        let base = format!("/resource-servers/{resource_server_id}/resources");
        Ok(ListPage::new(&base, resources, total, limit, offset))
    }

    /// Replaces name and description. Handle, parent and permission are kept.
    pub async fn update_resource(
        &self,
        resource_server_id: &str,
        id: &str,
        input: UpdateResource,
    ) -> HierarchyResult<Resource> {
        if id.is_empty() || resource_server_id.is_empty() {
            return Err(HierarchyError::MissingId);
        }

        let (server_key, _) = self.resolve_resource_server(resource_server_id).await?;
        let (_, current) = self
            .resolve_resource(&server_key, id, HierarchyError::ResourceNotFound)
            .await?;

        let updated = Resource {
            name: input.name,
            description: input.description,
            ..current
        };

        self.repo
            .update_resource(&server_key, &updated)
            .await
            .map_err(|e| store_failure("Failed to update resource", e))?;

        Ok(updated)
    }

    /// Succeeds when the server or the resource does not exist.
    pub async fn delete_resource(&self, resource_server_id: &str, id: &str) -> HierarchyResult<()> {
        if id.is_empty() || resource_server_id.is_empty() {
            return Err(HierarchyError::MissingId);
        }

        let server_key = match self.repo.get_resource_server(resource_server_id).await {
            Ok((key, _)) => key,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(store_failure("Failed to check resource server existence", e)),
        };

        let resource_key = match self.repo.get_resource(&server_key, id).await {
            Ok((key, _)) => key,
            Err(e) if e.is_not_found() => {
                debug!(resource_id = %id, "Resource already absent");
                return Ok(());
            }
            Err(e) => return Err(store_failure("Failed to check resource existence", e)),
        };

        let has_dependencies = self
            .repo
            .resource_has_dependencies(&resource_key)
            .await
            .map_err(|e| store_failure("Failed to check dependencies", e))?;
        if has_dependencies {
            debug!(resource_id = %id, "Resource has dependencies");
            return Err(HierarchyError::CannotDelete);
        }

        self.repo
            .delete_resource(&server_key, id)
            .await
            .map_err(|e| store_failure("Failed to delete resource", e))
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Creates an action on the server (`resource_id = None`) or on one of
    /// its resources.
    pub async fn create_action(
        &self,
        resource_server_id: &str,
        resource_id: Option<&str>,
        input: CreateAction,
    ) -> HierarchyResult<Action> {
        let (server_key, server) = self.resolve_resource_server(resource_server_id).await?;
        let scope = self.resolve_action_scope(&server_key, resource_id).await?;

        require_name_and_handle(&input.name, &input.handle, &server.delimiter)?;

        let resource_key = scope.as_ref().map(|(key, _)| key);
        let handle_exists = self
            .repo
            .action_handle_exists(&server_key, resource_key, &input.handle)
            .await
            .map_err(|e| store_failure("Failed to check action handle", e))?;
        if handle_exists {
            debug!(handle = %input.handle, "Action handle already exists in scope");
            return Err(HierarchyError::HandleConflict);
        }

        let permission = derive_permission(
            &server,
            scope.as_ref().map(|(_, resource)| resource),
            &input.handle,
        );

        let action = Action {
            id: self.generate_id()?,
            name: input.name,
            handle: input.handle,
            description: input.description,
            permission,
        };

        self.repo
            .create_action(&server_key, resource_key, &action)
            .await
            .map_err(|e| write_failure("Failed to create action", e, handle_conflict))?;

        debug!(
            resource_server_id = %resource_server_id,
            action_id = %action.id,
            permission = %action.permission,
            "Created action"
        );
        Ok(action)
    }

    pub async fn get_action(
        &self,
        resource_server_id: &str,
        resource_id: Option<&str>,
        id: &str,
    ) -> HierarchyResult<Action> {
        if id.is_empty() || resource_server_id.is_empty() || resource_id == Some("") {
            return Err(HierarchyError::MissingId);
        }

        let (server_key, _) = self.resolve_resource_server(resource_server_id).await?;
        let scope = self.resolve_action_scope(&server_key, resource_id).await?;

        match self
            .repo
            .get_action(&server_key, scope.as_ref().map(|(key, _)| key), id)
            .await
        {
            Ok(action) => Ok(action),
            Err(e) if e.is_not_found() => {
                debug!(action_id = %id, "Action not found");
                Err(HierarchyError::ActionNotFound)
            }
            Err(e) => Err(store_failure("Failed to get action", e)),
        }
    }

    pub async fn list_actions(
        &self,
        resource_server_id: &str,
        resource_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> HierarchyResult<ActionList> {
        let (limit, offset) = self.check_pagination(limit, offset)?;
        if resource_server_id.is_empty() || resource_id == Some("") {
            return Err(HierarchyError::MissingId);
        }

        let (server_key, _) = self.resolve_resource_server(resource_server_id).await?;
        let scope = self.resolve_action_scope(&server_key, resource_id).await?;
        let resource_key = scope.as_ref().map(|(key, _)| key);

        let total = self
            .repo
            .count_actions(&server_key, resource_key)
            .await
            .map_err(|e| store_failure("Failed to count actions", e))?;
        let actions = self
            .repo
            .list_actions(&server_key, resource_key, limit, offset)
            .await
            .map_err(|e| store_failure("Failed to list actions", e))?;

        let base = match resource_id {
            Some(resource_id) => {
                format!("/resource-servers/{resource_server_id}/resources/{resource_id}/actions")
            }
            None => format!("/resource-servers/{resource_server_id}/actions"),
        };
        Ok(ListPage::new(&base, actions, total, limit, offset))
    }

    /// Replaces name and description. Handle and permission are kept.
    pub async fn update_action(
        &self,
        resource_server_id: &str,
        resource_id: Option<&str>,
        id: &str,
        input: UpdateAction,
    ) -> HierarchyResult<Action> {
        if id.is_empty() || resource_server_id.is_empty() || resource_id == Some("") {
            return Err(HierarchyError::MissingId);
        }

        let (server_key, _) = self.resolve_resource_server(resource_server_id).await?;
        let scope = self.resolve_action_scope(&server_key, resource_id).await?;
        let resource_key = scope.as_ref().map(|(key, _)| key);

        let current = match self.repo.get_action(&server_key, resource_key, id).await {
            Ok(action) => action,
            Err(e) if e.is_not_found() => return Err(HierarchyError::ActionNotFound),
            Err(e) => return Err(store_failure("Failed to get action", e)),
        };

        let updated = Action {
            name: input.name,
            description: input.description,
            ..current
        };

        self.repo
            .update_action(&server_key, resource_key, &updated)
            .await
            .map_err(|e| store_failure("Failed to update action", e))?;

        Ok(updated)
    }

    /// Succeeds when the server, the resource or the action does not exist.
    pub async fn delete_action(
        &self,
        resource_server_id: &str,
        resource_id: Option<&str>,
        id: &str,
    ) -> HierarchyResult<()> {
        if id.is_empty() || resource_server_id.is_empty() || resource_id == Some("") {
            return Err(HierarchyError::MissingId);
        }

        let server_key = match self.resolve_resource_server(resource_server_id).await {
            Ok((key, _)) => key,
            Err(HierarchyError::ResourceServerNotFound) => return Ok(()),
            Err(e) => return Err(e),
        };
        let scope = match self.resolve_action_scope(&server_key, resource_id).await {
            Ok(scope) => scope,
            Err(HierarchyError::ResourceNotFound) => return Ok(()),
            Err(e) => return Err(e),
        };
        let resource_key = scope.as_ref().map(|(key, _)| key);

        let exists = self
            .repo
            .action_exists(&server_key, resource_key, id)
            .await
            .map_err(|e| store_failure("Failed to check action existence", e))?;
        if !exists {
            debug!(action_id = %id, "Action already absent");
            return Ok(());
        }

        self.repo
            .delete_action(&server_key, resource_key, id)
            .await
            .map_err(|e| store_failure("Failed to delete action", e))
    }

    // -----------------------------------------------------------------------
    // Permissions
    // -----------------------------------------------------------------------

    /// Returns the permissions, in input order, that match no resource or
    /// action of the server. Every input is invalid for an unknown server.
    pub async fn validate_permissions(
        &self,
        resource_server_id: &str,
        permissions: &[String],
    ) -> HierarchyResult<Vec<String>> {
        debug!(
            resource_server_id = %resource_server_id,
            permission_count = permissions.len(),
            "Validating permissions"
        );

        if permissions.is_empty() {
            return Ok(Vec::new());
        }

        let server_key = match self.repo.get_resource_server(resource_server_id).await {
            Ok((key, _)) => key,
            Err(e) if e.is_not_found() => {
                debug!(resource_server_id = %resource_server_id, "Resource server not found");
                return Ok(permissions.to_vec());
            }
            Err(e) => return Err(store_failure("Failed to get resource server", e)),
        };

        self.repo
            .validate_permissions(&server_key, permissions)
            .await
            .map_err(|e| store_failure("Failed to validate permissions", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_conflict(field: &str) -> StoreError {
        StoreError::Conflict {
            entity: "resource_server".into(),
            field: field.into(),
            detail: "index already contains the value".into(),
        }
    }

    #[test]
    fn lost_races_map_to_the_violated_field() {
        assert_eq!(
            write_failure("create", store_conflict("identifier"), resource_server_conflict),
            HierarchyError::IdentifierConflict
        );
        assert_eq!(
            write_failure("create", store_conflict("name"), resource_server_conflict),
            HierarchyError::NameConflict
        );
        assert_eq!(
            write_failure("create", store_conflict("handle"), handle_conflict),
            HierarchyError::HandleConflict
        );
    }

    #[test]
    fn other_write_failures_are_internal() {
        assert_eq!(
            write_failure(
                "create",
                StoreError::Database("connection reset".into()),
                resource_server_conflict
            ),
            HierarchyError::Internal
        );
    }
}
