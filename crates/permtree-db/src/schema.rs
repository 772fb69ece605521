//! Schema definitions and migration runner for SurrealDB.
//!
//! Every table is SCHEMAFULL. Rows carry their public UUID in
//! `external_id`; the record key is the storage-internal key handed to the
//! hierarchy service and used for all cross-table links.
//!
//! Optional links are mirrored into a non-optional `*_scope` string (empty
//! for "none") so the composite unique indexes treat top-level entries as
//! one scope.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "permission_hierarchy",
    sql: SCHEMA_V1,
}];

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organization units (owned elsewhere, mirrored for existence checks)
-- =======================================================================
DEFINE TABLE organization_unit SCHEMAFULL;
DEFINE FIELD name ON TABLE organization_unit TYPE string;
DEFINE FIELD handle ON TABLE organization_unit TYPE string;
DEFINE FIELD created_at ON TABLE organization_unit TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organization_unit_handle ON TABLE organization_unit \
    COLUMNS handle UNIQUE;

-- =======================================================================
-- Resource servers
-- =======================================================================
DEFINE TABLE resource_server SCHEMAFULL;
DEFINE FIELD external_id ON TABLE resource_server TYPE string;
DEFINE FIELD name ON TABLE resource_server TYPE string;
DEFINE FIELD description ON TABLE resource_server TYPE string DEFAULT '';
DEFINE FIELD identifier ON TABLE resource_server TYPE option<string>;
DEFINE FIELD ou_id ON TABLE resource_server TYPE string;
DEFINE FIELD delimiter ON TABLE resource_server TYPE string \
    ASSERT string::len($value) = 1;
DEFINE FIELD created_at ON TABLE resource_server TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resource_server TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resource_server_external_id ON TABLE resource_server \
    COLUMNS external_id UNIQUE;
DEFINE INDEX idx_resource_server_name ON TABLE resource_server \
    COLUMNS name UNIQUE;
DEFINE INDEX idx_resource_server_identifier ON TABLE resource_server \
    COLUMNS identifier UNIQUE;

-- =======================================================================
-- Resources (tree per resource server)
-- =======================================================================
DEFINE TABLE resource SCHEMAFULL;
DEFINE FIELD external_id ON TABLE resource TYPE string;
DEFINE FIELD server_key ON TABLE resource TYPE string;
DEFINE FIELD parent_scope ON TABLE resource TYPE string DEFAULT '';
DEFINE FIELD parent_external_id ON TABLE resource TYPE option<string>;
DEFINE FIELD name ON TABLE resource TYPE string;
DEFINE FIELD handle ON TABLE resource TYPE string;
DEFINE FIELD description ON TABLE resource TYPE string DEFAULT '';
DEFINE FIELD permission ON TABLE resource TYPE string;
DEFINE FIELD created_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resource_external_id ON TABLE resource \
    COLUMNS external_id UNIQUE;
DEFINE INDEX idx_resource_sibling_handle ON TABLE resource \
    COLUMNS server_key, parent_scope, handle UNIQUE;
DEFINE INDEX idx_resource_permission ON TABLE resource \
    COLUMNS server_key, permission;

-- =======================================================================
-- Actions (server-level when resource_scope is empty)
-- =======================================================================
DEFINE TABLE action SCHEMAFULL;
DEFINE FIELD external_id ON TABLE action TYPE string;
DEFINE FIELD server_key ON TABLE action TYPE string;
DEFINE FIELD resource_scope ON TABLE action TYPE string DEFAULT '';
DEFINE FIELD name ON TABLE action TYPE string;
DEFINE FIELD handle ON TABLE action TYPE string;
DEFINE FIELD description ON TABLE action TYPE string DEFAULT '';
DEFINE FIELD permission ON TABLE action TYPE string;
DEFINE FIELD created_at ON TABLE action TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE action TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_action_external_id ON TABLE action \
    COLUMNS external_id UNIQUE;
DEFINE INDEX idx_action_scope_handle ON TABLE action \
    COLUMNS server_key, resource_scope, handle UNIQUE;
DEFINE INDEX idx_action_permission ON TABLE action \
    COLUMNS server_key, permission;
";

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

/// Apply every migration newer than the recorded schema version.
///
/// Safe to call on every start: the tracking table is created with
/// `IF NOT EXISTS` and already-applied versions are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current_version = applied_version(db).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );

        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}' failed: {e}",
                migration.version, migration.name
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "recording v{} failed: {e}",
                    migration.version
                ))
            })?;
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
