//! Integration tests for connection management over the embedded engine.

use permtree_core::models::ResourceServer;
use permtree_core::repository::{HierarchyRepository, OrganizationUnitDirectory};
use permtree_db::{DbConfig, DbManager};

#[tokio::test]
async fn in_memory_connection_is_migrated_and_usable() {
    let manager = DbManager::connect(&DbConfig::in_memory()).await.unwrap();

    let units = manager.organization_units();
    let unit = units.create("Platform", "platform").await.unwrap();
    assert_eq!(units.get_organization_unit(&unit.id).await.unwrap(), unit);

    let repo = manager.hierarchy_repository();
    let server = ResourceServer {
        id: "rs-1".into(),
        name: "platform-api".into(),
        description: String::new(),
        identifier: None,
        organization_unit_id: unit.id.clone(),
        delimiter: ":".into(),
    };
    repo.create_resource_server(&server).await.unwrap();
    assert_eq!(repo.count_resource_servers().await.unwrap(), 1);
}

#[test]
fn default_config_targets_local_server() {
    let config = DbConfig::default();
    assert_eq!(config.endpoint, "ws://127.0.0.1:8000");
    assert_eq!(config.namespace, "permtree");
    assert_eq!(config.database, "main");
    assert!(config.credentials.is_none());
}
