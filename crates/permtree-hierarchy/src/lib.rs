//! Permtree Hierarchy: management of resource servers, resources and
//! actions, with permission derivation and the typed error taxonomy.
//!
//! [`HierarchyService`] is generic over the data-access contract, so this
//! crate never depends on a storage engine.

pub mod config;
pub mod error;
pub mod service;

pub use config::HierarchyConfig;
pub use error::{HierarchyError, HierarchyResult};
pub use service::HierarchyService;
