//! SurrealDB connection management.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::repository::{SurrealHierarchyRepository, SurrealOrganizationUnitDirectory};
use crate::schema::run_migrations;

/// Root credentials for a remote SurrealDB instance.
#[derive(Debug, Clone, Deserialize)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
}

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Engine endpoint, e.g. `ws://127.0.0.1:8000` or `mem://`.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    /// Omit for embedded engines that need no sign-in.
    pub credentials: Option<DbCredentials>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000".into(),
            namespace: "permtree".into(),
            database: "main".into(),
            credentials: None,
        }
    }
}

impl DbConfig {
    /// Embedded in-memory engine; nothing survives the process.
    pub fn in_memory() -> Self {
        Self {
            endpoint: "mem://".into(),
            ..Self::default()
        }
    }
}

/// Owns a migrated SurrealDB connection and hands out repositories over it.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    /// Connect, sign in when credentials are configured, select the
    /// namespace and database, and bring the schema up to date.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = any::connect(config.endpoint.as_str()).await?;

        if let Some(credentials) = &config.credentials {
            db.signin(Root {
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        run_migrations(&db).await?;

        info!("SurrealDB ready");

        Ok(Self { db })
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }

    pub fn hierarchy_repository(&self) -> SurrealHierarchyRepository<Any> {
        SurrealHierarchyRepository::new(self.db.clone())
    }

    pub fn organization_units(&self) -> SurrealOrganizationUnitDirectory<Any> {
        SurrealOrganizationUnitDirectory::new(self.db.clone())
    }
}
