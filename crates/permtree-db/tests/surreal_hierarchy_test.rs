//! Integration tests for the SurrealDB hierarchy store using in-memory SurrealDB.

use permtree_core::models::{Action, Resource, ResourceServer};
use permtree_core::repository::{HierarchyRepository, OrganizationUnitDirectory};
use permtree_db::{SurrealHierarchyRepository, SurrealOrganizationUnitDirectory};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> (Surreal<Db>, SurrealHierarchyRepository<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    permtree_db::run_migrations(&db).await.unwrap();
    let repo = SurrealHierarchyRepository::new(db.clone());
    (db, repo)
}

fn server(id: &str, name: &str) -> ResourceServer {
    ResourceServer {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        identifier: None,
        organization_unit_id: "ou-1".into(),
        delimiter: ":".into(),
    }
}

fn resource(id: &str, handle: &str, parent: Option<&str>, permission: &str) -> Resource {
    Resource {
        id: id.into(),
        name: handle.into(),
        handle: handle.into(),
        description: String::new(),
        parent: parent.map(str::to_string),
        permission: permission.into(),
    }
}

fn action(id: &str, handle: &str, permission: &str) -> Action {
    Action {
        id: id.into(),
        name: handle.into(),
        handle: handle.into(),
        description: String::new(),
        permission: permission.into(),
    }
}

/// Creates a server and returns its internal key.
async fn create_server(repo: &SurrealHierarchyRepository<Db>, id: &str) -> String {
    repo.create_resource_server(&server(id, id)).await.unwrap();
    repo.get_resource_server(id).await.unwrap().0
}

// ---------------------------------------------------------------------------
// Resource servers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resource_server_round_trip() {
    let (_db, repo) = setup().await;
    let mut input = server("rs-1", "billing");
    input.identifier = Some("https://billing.example.com".into());
    input.description = "Billing API".into();

    repo.create_resource_server(&input).await.unwrap();

    let (key, stored) = repo.get_resource_server("rs-1").await.unwrap();
    assert!(!key.is_empty());
    assert_eq!(stored, input);

    assert!(repo.resource_server_name_exists("billing").await.unwrap());
    assert!(!repo.resource_server_name_exists("other").await.unwrap());
    assert!(
        repo.resource_server_identifier_exists("https://billing.example.com")
            .await
            .unwrap()
    );

    let err = repo.get_resource_server("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn duplicate_server_name_violates_unique_index() {
    let (_db, repo) = setup().await;
    repo.create_resource_server(&server("rs-1", "same")).await.unwrap();

    let err = repo
        .create_resource_server(&server("rs-2", "same"))
        .await
        .unwrap_err();
    assert_eq!(err.conflict_field(), Some("name"), "unexpected error: {err}");
}

#[tokio::test]
async fn duplicate_server_identifier_violates_unique_index() {
    let (_db, repo) = setup().await;
    let mut first = server("rs-1", "first");
    first.identifier = Some("https://api.example.com".into());
    repo.create_resource_server(&first).await.unwrap();

    let mut second = server("rs-2", "second");
    second.identifier = Some("https://api.example.com".into());
    let err = repo.create_resource_server(&second).await.unwrap_err();
    assert_eq!(err.conflict_field(), Some("identifier"), "unexpected error: {err}");

    // Absent identifiers never collide with each other.
    second.identifier = None;
    repo.create_resource_server(&second).await.unwrap();
    repo.create_resource_server(&server("rs-3", "third")).await.unwrap();

    second.identifier = Some("https://api.example.com".into());
    let err = repo.update_resource_server(&second).await.unwrap_err();
    assert_eq!(err.conflict_field(), Some("identifier"), "unexpected error: {err}");
}

#[tokio::test]
async fn resource_servers_list_newest_first() {
    let (_db, repo) = setup().await;
    for i in 1..=4 {
        repo.create_resource_server(&server(&format!("rs-{i}"), &format!("server {i}")))
            .await
            .unwrap();
    }

    assert_eq!(repo.count_resource_servers().await.unwrap(), 4);

    let page = repo.list_resource_servers(2, 1).await.unwrap();
    let ids: Vec<_> = page.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["rs-3", "rs-2"]);
}

#[tokio::test]
async fn update_resource_server_never_rewrites_delimiter() {
    let (_db, repo) = setup().await;
    repo.create_resource_server(&server("rs-1", "before")).await.unwrap();

    let mut changed = server("rs-1", "after");
    changed.delimiter = "/".into();
    changed.organization_unit_id = "ou-2".into();
    repo.update_resource_server(&changed).await.unwrap();

    let (_, stored) = repo.get_resource_server("rs-1").await.unwrap();
    assert_eq!(stored.name, "after");
    assert_eq!(stored.organization_unit_id, "ou-2");
    assert_eq!(stored.delimiter, ":");
}

#[tokio::test]
async fn delete_resource_server_tolerates_missing_rows() {
    let (_db, repo) = setup().await;
    repo.delete_resource_server("missing").await.unwrap();

    repo.create_resource_server(&server("rs-1", "gone")).await.unwrap();
    repo.delete_resource_server("rs-1").await.unwrap();
    assert!(
        repo.get_resource_server("rs-1")
            .await
            .unwrap_err()
            .is_not_found()
    );
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resources_are_listed_per_parent() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;

    repo.create_resource(&rs, None, &resource("r-1", "orders", None, "orders"))
        .await
        .unwrap();
    repo.create_resource(&rs, None, &resource("r-2", "users", None, "users"))
        .await
        .unwrap();
    let (orders_key, _) = repo.get_resource(&rs, "r-1").await.unwrap();
    repo.create_resource(
        &rs,
        Some(&orders_key),
        &resource("r-3", "items", Some("r-1"), "orders:items"),
    )
    .await
    .unwrap();

    let top = repo.list_resources(&rs, None, 10, 0).await.unwrap();
    let handles: Vec<_> = top.iter().map(|r| r.handle.as_str()).collect();
    assert_eq!(handles, ["users", "orders"]);
    assert_eq!(repo.count_resources(&rs, None).await.unwrap(), 2);

    let children = repo
        .list_resources(&rs, Some(&orders_key), 10, 0)
        .await
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].parent.as_deref(), Some("r-1"));
    assert_eq!(children[0].permission, "orders:items");
    assert_eq!(
        repo.count_resources(&rs, Some(&orders_key)).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn resource_lookup_is_scoped_to_server() {
    let (_db, repo) = setup().await;
    let a = create_server(&repo, "rs-a").await;
    let b = create_server(&repo, "rs-b").await;
    repo.create_resource(&a, None, &resource("r-1", "docs", None, "docs"))
        .await
        .unwrap();

    assert!(repo.get_resource(&a, "r-1").await.is_ok());
    assert!(repo.get_resource(&b, "r-1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn sibling_handles_are_unique() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;
    repo.create_resource(&rs, None, &resource("r-1", "a", None, "a"))
        .await
        .unwrap();
    repo.create_resource(&rs, None, &resource("r-2", "b", None, "b"))
        .await
        .unwrap();
    let (a_key, _) = repo.get_resource(&rs, "r-1").await.unwrap();
    let (b_key, _) = repo.get_resource(&rs, "r-2").await.unwrap();

    repo.create_resource(&rs, Some(&a_key), &resource("r-3", "users", Some("r-1"), "a:users"))
        .await
        .unwrap();
    repo.create_resource(&rs, Some(&b_key), &resource("r-4", "users", Some("r-2"), "b:users"))
        .await
        .unwrap();

    assert!(repo.resource_handle_exists(&rs, Some(&a_key), "users").await.unwrap());
    assert!(!repo.resource_handle_exists(&rs, None, "users").await.unwrap());

    let err = repo
        .create_resource(&rs, Some(&a_key), &resource("r-5", "users", Some("r-1"), "a:users"))
        .await
        .unwrap_err();
    assert_eq!(err.conflict_field(), Some("handle"), "unexpected error: {err}");
}

#[tokio::test]
async fn update_resource_changes_only_name_and_description() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;
    repo.create_resource(&rs, None, &resource("r-1", "docs", None, "docs"))
        .await
        .unwrap();

    let mut changed = resource("r-1", "ignored", Some("elsewhere"), "ignored");
    changed.name = "Documents".into();
    changed.description = "All documents".into();
    repo.update_resource(&rs, &changed).await.unwrap();

    let (_, stored) = repo.get_resource(&rs, "r-1").await.unwrap();
    assert_eq!(stored.name, "Documents");
    assert_eq!(stored.description, "All documents");
    assert_eq!(stored.handle, "docs");
    assert_eq!(stored.parent, None);
    assert_eq!(stored.permission, "docs");
}

#[tokio::test]
async fn dependency_checks_see_children_and_actions() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;
    assert!(!repo.resource_server_has_dependencies(&rs).await.unwrap());

    repo.create_resource(&rs, None, &resource("r-1", "parent", None, "parent"))
        .await
        .unwrap();
    let (parent_key, _) = repo.get_resource(&rs, "r-1").await.unwrap();
    assert!(repo.resource_server_has_dependencies(&rs).await.unwrap());
    assert!(!repo.resource_has_dependencies(&parent_key).await.unwrap());

    repo.create_action(&rs, Some(&parent_key), &action("a-1", "read", "parent:read"))
        .await
        .unwrap();
    assert!(repo.resource_has_dependencies(&parent_key).await.unwrap());

    repo.delete_action(&rs, Some(&parent_key), "a-1").await.unwrap();
    repo.create_resource(
        &rs,
        Some(&parent_key),
        &resource("r-2", "child", Some("r-1"), "parent:child"),
    )
    .await
    .unwrap();
    assert!(repo.resource_has_dependencies(&parent_key).await.unwrap());

    repo.delete_resource(&rs, "r-2").await.unwrap();
    repo.delete_resource(&rs, "r-2").await.unwrap();
    assert!(!repo.resource_has_dependencies(&parent_key).await.unwrap());
}

#[tokio::test]
async fn server_level_actions_count_as_server_dependencies() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;
    repo.create_action(&rs, None, &action("a-1", "admin", "admin"))
        .await
        .unwrap();
    assert!(repo.resource_server_has_dependencies(&rs).await.unwrap());
}

#[tokio::test]
async fn circular_dependency_walks_ancestors() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;
    repo.create_resource(&rs, None, &resource("r-a", "a", None, "a"))
        .await
        .unwrap();
    let (a_key, _) = repo.get_resource(&rs, "r-a").await.unwrap();
    repo.create_resource(&rs, Some(&a_key), &resource("r-b", "b", Some("r-a"), "a:b"))
        .await
        .unwrap();
    let (b_key, _) = repo.get_resource(&rs, "r-b").await.unwrap();
    repo.create_resource(&rs, Some(&b_key), &resource("r-c", "c", Some("r-b"), "a:b:c"))
        .await
        .unwrap();

    // Moving `a` under its grandchild would close a loop.
    assert!(repo.check_circular_dependency(&rs, "r-a", "r-c").await.unwrap());
    assert!(repo.check_circular_dependency(&rs, "r-a", "r-a").await.unwrap());
    assert!(!repo.check_circular_dependency(&rs, "r-c", "r-a").await.unwrap());
    assert!(!repo.check_circular_dependency(&rs, "r-a", "missing").await.unwrap());
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn actions_are_scoped_by_resource() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;
    repo.create_resource(&rs, None, &resource("r-1", "docs", None, "docs"))
        .await
        .unwrap();
    let (docs, _) = repo.get_resource(&rs, "r-1").await.unwrap();

    repo.create_action(&rs, None, &action("a-1", "read", "read"))
        .await
        .unwrap();
    repo.create_action(&rs, Some(&docs), &action("a-2", "read", "docs:read"))
        .await
        .unwrap();
    repo.create_action(&rs, Some(&docs), &action("a-3", "write", "docs:write"))
        .await
        .unwrap();

    assert_eq!(repo.count_actions(&rs, None).await.unwrap(), 1);
    assert_eq!(repo.count_actions(&rs, Some(&docs)).await.unwrap(), 2);

    let on_docs = repo.list_actions(&rs, Some(&docs), 10, 0).await.unwrap();
    let handles: Vec<_> = on_docs.iter().map(|a| a.handle.as_str()).collect();
    assert_eq!(handles, ["write", "read"]);

    assert!(repo.action_exists(&rs, None, "a-1").await.unwrap());
    assert!(!repo.action_exists(&rs, Some(&docs), "a-1").await.unwrap());
    assert!(repo.get_action(&rs, Some(&docs), "a-1").await.unwrap_err().is_not_found());
    assert_eq!(
        repo.get_action(&rs, Some(&docs), "a-2").await.unwrap().permission,
        "docs:read"
    );

    assert!(repo.action_handle_exists(&rs, None, "read").await.unwrap());
    assert!(!repo.action_handle_exists(&rs, None, "write").await.unwrap());
    let err = repo
        .create_action(&rs, None, &action("a-4", "read", "read"))
        .await
        .unwrap_err();
    assert_eq!(err.conflict_field(), Some("handle"), "unexpected error: {err}");
}

#[tokio::test]
async fn update_action_keeps_handle_and_permission() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;
    repo.create_action(&rs, None, &action("a-1", "read", "read"))
        .await
        .unwrap();

    let mut changed = action("a-1", "ignored", "ignored");
    changed.name = "Read".into();
    changed.description = "Read anything".into();
    repo.update_action(&rs, None, &changed).await.unwrap();

    let stored = repo.get_action(&rs, None, "a-1").await.unwrap();
    assert_eq!(stored.name, "Read");
    assert_eq!(stored.description, "Read anything");
    assert_eq!(stored.handle, "read");
    assert_eq!(stored.permission, "read");
}

#[tokio::test]
async fn validate_permissions_returns_unknown_in_order() {
    let (_db, repo) = setup().await;
    let rs = create_server(&repo, "rs-1").await;
    let other = create_server(&repo, "rs-2").await;
    repo.create_resource(&rs, None, &resource("r-1", "orders", None, "orders"))
        .await
        .unwrap();
    let (orders, _) = repo.get_resource(&rs, "r-1").await.unwrap();
    repo.create_action(&rs, Some(&orders), &action("a-1", "read", "orders:read"))
        .await
        .unwrap();
    repo.create_resource(&other, None, &resource("r-2", "billing", None, "billing"))
        .await
        .unwrap();

    let requested: Vec<String> = ["billing", "orders:read", "orders:write", "orders"]
        .into_iter()
        .map(String::from)
        .collect();
    let invalid = repo.validate_permissions(&rs, &requested).await.unwrap();
    assert_eq!(invalid, ["billing", "orders:write"]);

    assert!(repo.validate_permissions(&rs, &[]).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Organization units
// ---------------------------------------------------------------------------

#[tokio::test]
async fn organization_units_are_found_by_id() {
    let (db, _repo) = setup().await;
    let directory = SurrealOrganizationUnitDirectory::new(db);

    let created = directory.create("Engineering", "engineering").await.unwrap();
    let found = directory.get_organization_unit(&created.id).await.unwrap();
    assert_eq!(found, created);

    let err = directory
        .get_organization_unit("00000000-0000-7000-8000-000000000000")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
