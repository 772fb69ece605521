//! SurrealDB repository implementations.

mod hierarchy;
mod organization_unit;
mod rows;

pub use hierarchy::SurrealHierarchyRepository;
pub use organization_unit::SurrealOrganizationUnitDirectory;
