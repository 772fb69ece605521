//! Storage backends for the permission hierarchy.
//!
//! - [`SurrealHierarchyRepository`] and [`SurrealOrganizationUnitDirectory`]
//!   persist to SurrealDB; [`DbManager`] connects and migrates.
//! - [`MemoryHierarchyStore`] keeps everything in process memory.

mod connection;
mod error;
mod memory;
mod repository;
mod schema;

pub use connection::{DbConfig, DbCredentials, DbManager};
pub use error::DbError;
pub use memory::MemoryHierarchyStore;
pub use repository::{SurrealHierarchyRepository, SurrealOrganizationUnitDirectory};
pub use schema::{run_migrations, schema_v1};
