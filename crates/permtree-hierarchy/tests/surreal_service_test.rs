//! Service behaviour over the embedded SurrealDB engine, where concurrent
//! writers are settled by the unique indexes.

use permtree_core::models::{CreateAction, CreateResource, CreateResourceServer};
use permtree_core::repository::UuidV7Generator;
use permtree_db::{
    DbConfig, DbManager, SurrealHierarchyRepository, SurrealOrganizationUnitDirectory,
};
use permtree_hierarchy::{HierarchyConfig, HierarchyError, HierarchyResult, HierarchyService};
use surrealdb::engine::any::Any;

type Service = HierarchyService<
    SurrealHierarchyRepository<Any>,
    SurrealOrganizationUnitDirectory<Any>,
    UuidV7Generator,
>;

async fn setup() -> (Service, String) {
    let db = DbManager::connect(&DbConfig::in_memory()).await.unwrap();
    let unit = db
        .organization_units()
        .create("Platform", "platform")
        .await
        .unwrap();
    let service = HierarchyService::new(
        db.hierarchy_repository(),
        db.organization_units(),
        UuidV7Generator,
        HierarchyConfig::default(),
    )
    .unwrap();
    (service, unit.id)
}

fn server_input(name: &str, identifier: Option<&str>, ou: &str) -> CreateResourceServer {
    CreateResourceServer {
        name: name.into(),
        description: String::new(),
        identifier: identifier.map(str::to_string),
        organization_unit_id: ou.into(),
        delimiter: None,
    }
}

/// Exactly one of two concurrent writers wins; the loser sees `expected`
/// whether it lost at the existence check or at the unique index.
fn assert_one_winner<T: std::fmt::Debug>(
    results: [HierarchyResult<T>; 2],
    expected: HierarchyError,
) {
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "unexpected outcome: {results:?}");
    let loser = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(loser, expected);
}

#[tokio::test]
async fn concurrent_servers_with_same_identifier_conflict() {
    let (service, ou) = setup().await;
    for round in 0..5 {
        let identifier = format!("https://api-{round}.example.com");
        let (a, b) = tokio::join!(
            service.create_resource_server(server_input(&format!("a-{round}"), Some(&identifier), &ou)),
            service.create_resource_server(server_input(&format!("b-{round}"), Some(&identifier), &ou)),
        );
        assert_one_winner([a, b], HierarchyError::IdentifierConflict);
    }
}

#[tokio::test]
async fn concurrent_servers_with_same_name_conflict() {
    let (service, ou) = setup().await;
    for round in 0..5 {
        let name = format!("server-{round}");
        let (a, b) = tokio::join!(
            service.create_resource_server(server_input(&name, None, &ou)),
            service.create_resource_server(server_input(&name, None, &ou)),
        );
        assert_one_winner([a, b], HierarchyError::NameConflict);
    }
}

#[tokio::test]
async fn servers_without_identifier_coexist() {
    let (service, ou) = setup().await;
    let (a, b) = tokio::join!(
        service.create_resource_server(server_input("first", None, &ou)),
        service.create_resource_server(server_input("second", Some(""), &ou)),
    );
    assert!(a.unwrap().identifier.is_none());
    assert!(b.unwrap().identifier.is_none());
}

#[tokio::test]
async fn concurrent_sibling_handles_conflict() {
    let (service, ou) = setup().await;
    let server = service
        .create_resource_server(server_input("orders", None, &ou))
        .await
        .unwrap();

    for round in 0..5 {
        let handle = format!("items-{round}");
        let input = CreateResource {
            name: "Items".into(),
            handle: handle.clone(),
            description: String::new(),
            parent: None,
        };
        let (a, b) = tokio::join!(
            service.create_resource(&server.id, input.clone()),
            service.create_resource(&server.id, input.clone()),
        );
        assert_one_winner([a, b], HierarchyError::HandleConflict);

        let action = CreateAction {
            name: "Read".into(),
            handle: format!("read-{round}"),
            description: String::new(),
        };
        let (a, b) = tokio::join!(
            service.create_action(&server.id, None, action.clone()),
            service.create_action(&server.id, None, action.clone()),
        );
        assert_one_winner([a, b], HierarchyError::HandleConflict);
    }
}
