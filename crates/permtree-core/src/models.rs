//! Domain models for the permission hierarchy.
//!
//! These are the core types shared across all crates.

pub mod action;
pub mod organization_unit;
pub mod resource;
pub mod resource_server;

pub use action::{Action, CreateAction, UpdateAction};
pub use organization_unit::OrganizationUnit;
pub use resource::{CreateResource, Resource, UpdateResource};
pub use resource_server::{CreateResourceServer, ResourceServer, UpdateResourceServer};
