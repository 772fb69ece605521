//! Data-access contract for the permission hierarchy.
//!
//! All operations are async. Every entity has an opaque external ID
//! (`String`) and a storage-internal [`HierarchyRepository::Key`] used to
//! scope lookups and link rows. Callers receive keys from lookups and hand
//! them back unchanged; they never construct or inspect them.

use std::fmt::Debug;

use crate::error::{IdGenerationError, StoreResult};
use crate::models::{Action, OrganizationUnit, Resource, ResourceServer};

pub trait HierarchyRepository: Send + Sync {
    /// Storage-internal identifier of a resource server or resource.
    type Key: Clone + Debug + PartialEq + Send + Sync + 'static;

    // -----------------------------------------------------------------------
    // Resource servers
    // -----------------------------------------------------------------------

    /// Persist a new resource server, including its delimiter.
    fn create_resource_server(
        &self,
        server: &ResourceServer,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Look up a resource server by external ID. `NotFound` when absent.
    fn get_resource_server(
        &self,
        id: &str,
    ) -> impl Future<Output = StoreResult<(Self::Key, ResourceServer)>> + Send;

    /// Newest first.
    fn list_resource_servers(
        &self,
        limit: u64,
        offset: u64,
    ) -> impl Future<Output = StoreResult<Vec<ResourceServer>>> + Send;

    fn count_resource_servers(&self) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Overwrite name, description, identifier and organization unit of
    /// `server.id`. The stored delimiter is never rewritten.
    fn update_resource_server(
        &self,
        server: &ResourceServer,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_resource_server(&self, id: &str) -> impl Future<Output = StoreResult<()>> + Send;

    fn resource_server_name_exists(
        &self,
        name: &str,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn resource_server_identifier_exists(
        &self,
        identifier: &str,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// True when the server has any resource or any server-level action.
    fn resource_server_has_dependencies(
        &self,
        server: &Self::Key,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    // -----------------------------------------------------------------------
    // Resources (scoped to a resource server)
    // -----------------------------------------------------------------------

    /// Persist a new resource. `parent` is the parent's key and must agree
    /// with `resource.parent`.
    fn create_resource(
        &self,
        server: &Self::Key,
        parent: Option<&Self::Key>,
        resource: &Resource,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Look up a resource by external ID within one server. A resource of
    /// another server is `NotFound`.
    fn get_resource(
        &self,
        server: &Self::Key,
        id: &str,
    ) -> impl Future<Output = StoreResult<(Self::Key, Resource)>> + Send;

    /// Children of `parent`, or top-level resources when `parent` is `None`.
    /// Newest first.
    fn list_resources(
        &self,
        server: &Self::Key,
        parent: Option<&Self::Key>,
        limit: u64,
        offset: u64,
    ) -> impl Future<Output = StoreResult<Vec<Resource>>> + Send;

    fn count_resources(
        &self,
        server: &Self::Key,
        parent: Option<&Self::Key>,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Overwrite name and description of `resource.id`.
    fn update_resource(
        &self,
        server: &Self::Key,
        resource: &Resource,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_resource(
        &self,
        server: &Self::Key,
        id: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// True when a sibling under the same `(server, parent)` uses `handle`.
    fn resource_handle_exists(
        &self,
        server: &Self::Key,
        parent: Option<&Self::Key>,
        handle: &str,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// True when the resource has a child resource or an attached action.
    fn resource_has_dependencies(
        &self,
        resource: &Self::Key,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Walks the ancestor chain upward starting at `proposed_parent_id` and
    /// reports whether `resource_id` appears on it (the proposed parent
    /// itself included).
    fn check_circular_dependency(
        &self,
        server: &Self::Key,
        resource_id: &str,
        proposed_parent_id: &str,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    // -----------------------------------------------------------------------
    // Actions (scoped to a server, and optionally to one of its resources)
    // -----------------------------------------------------------------------

    fn create_action(
        &self,
        server: &Self::Key,
        resource: Option<&Self::Key>,
        action: &Action,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// `resource = None` addresses server-level actions only.
    fn get_action(
        &self,
        server: &Self::Key,
        resource: Option<&Self::Key>,
        id: &str,
    ) -> impl Future<Output = StoreResult<Action>> + Send;

    /// Newest first.
    fn list_actions(
        &self,
        server: &Self::Key,
        resource: Option<&Self::Key>,
        limit: u64,
        offset: u64,
    ) -> impl Future<Output = StoreResult<Vec<Action>>> + Send;

    fn count_actions(
        &self,
        server: &Self::Key,
        resource: Option<&Self::Key>,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Overwrite name and description of `action.id`.
    fn update_action(
        &self,
        server: &Self::Key,
        resource: Option<&Self::Key>,
        action: &Action,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_action(
        &self,
        server: &Self::Key,
        resource: Option<&Self::Key>,
        id: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn action_exists(
        &self,
        server: &Self::Key,
        resource: Option<&Self::Key>,
        id: &str,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// True when an action in the same `(server, resource)` scope uses `handle`.
    fn action_handle_exists(
        &self,
        server: &Self::Key,
        resource: Option<&Self::Key>,
        handle: &str,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Returns, in input order, the permissions matching neither a resource
    /// nor an action of `server`.
    fn validate_permissions(
        &self,
        server: &Self::Key,
        permissions: &[String],
    ) -> impl Future<Output = StoreResult<Vec<String>>> + Send;
}

/// Read access to the organization-unit directory.
pub trait OrganizationUnitDirectory: Send + Sync {
    /// `NotFound` when no unit has this ID.
    fn get_organization_unit(
        &self,
        id: &str,
    ) -> impl Future<Output = StoreResult<OrganizationUnit>> + Send;
}

/// Source of opaque external identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<String, IdGenerationError>;
}

/// Time-ordered UUIDv7 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate(&self) -> Result<String, IdGenerationError> {
        Ok(uuid::Uuid::now_v7().to_string())
    }
}
