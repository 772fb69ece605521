//! Permission string derivation.

use crate::models::{Resource, ResourceServer};

/// Builds the permission for a resource or action identified by `handle`.
///
/// A top-level entity's permission is its handle. Under a parent resource
/// it is the parent's permission, the server's delimiter, then the handle.
/// Nothing is escaped; handles are validated never to contain the
/// delimiter.
pub fn derive_permission(
    resource_server: &ResourceServer,
    parent: Option<&Resource>,
    handle: &str,
) -> String {
    match parent {
        Some(parent) => format!(
            "{}{}{}",
            parent.permission, resource_server.delimiter, handle
        ),
        None => handle.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(delimiter: &str) -> ResourceServer {
        ResourceServer {
            id: "rs1".into(),
            name: "shop".into(),
            description: String::new(),
            identifier: None,
            organization_unit_id: "ou-1".into(),
            delimiter: delimiter.into(),
        }
    }

    fn resource(permission: &str) -> Resource {
        Resource {
            id: "r1".into(),
            name: "Orders".into(),
            handle: "orders".into(),
            description: String::new(),
            parent: None,
            permission: permission.into(),
        }
    }

    #[test]
    fn top_level_permission_is_the_handle() {
        assert_eq!(derive_permission(&server(":"), None, "orders"), "orders");
        assert_eq!(derive_permission(&server("/"), None, "a.b"), "a.b");
    }

    #[test]
    fn nested_permission_joins_parent_with_delimiter() {
        let parent = resource("orders");
        assert_eq!(
            derive_permission(&server(":"), Some(&parent), "items"),
            "orders:items"
        );

        let grandparent_chain = resource("orders:items");
        assert_eq!(
            derive_permission(&server(":"), Some(&grandparent_chain), "read"),
            "orders:items:read"
        );
    }

    #[test]
    fn delimiter_comes_from_the_server() {
        let parent = resource("docs");
        for d in [".", "_", ":", "-", "/"] {
            assert_eq!(
                derive_permission(&server(d), Some(&parent), "edit"),
                format!("docs{d}edit")
            );
        }
    }
}
