//! Permtree Core: domain model, validation primitives, permission
//! derivation and the data-access contract for the permission hierarchy.
//!
//! The hierarchy is: resource servers contain a tree of resources, and
//! actions hang off either a server or a resource. Every resource and
//! action carries a permission string derived from its position.

pub mod error;
pub mod models;
pub mod pagination;
pub mod permission;
pub mod repository;
pub mod validation;

pub use error::{IdGenerationError, StoreError, StoreResult};
pub use pagination::{
    ActionList, Link, LinkRel, ListPage, Listed, ResourceList, ResourceServerList,
};
pub use permission::derive_permission;
pub use repository::{HierarchyRepository, IdGenerator, OrganizationUnitDirectory, UuidV7Generator};
pub use validation::ValidationError;
