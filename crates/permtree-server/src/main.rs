//! Permtree Server: application entry point.
//!
//! Loads configuration, connects to SurrealDB (running migrations) and
//! builds the hierarchy service. HTTP transport is provided by adapters
//! layered on top of [`HierarchyService`].

mod settings;

use std::process::ExitCode;

use permtree_core::repository::UuidV7Generator;
use permtree_db::{DbError, DbManager};
use permtree_hierarchy::{HierarchyError, HierarchyService};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

#[derive(Debug, Error)]
enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid log directive: {0}")]
    LogDirective(#[from] ParseError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Permtree server failed");
            eprintln!("permtree-server: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let server_config = settings::load(settings::config_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(server_config.log_level.parse()?),
        )
        .json()
        .init();

    info!("Starting permtree server...");

    let db = DbManager::connect(&server_config.db).await?;
    let service = HierarchyService::new(
        db.hierarchy_repository(),
        db.organization_units(),
        UuidV7Generator,
        server_config.hierarchy,
    )?;

    let servers = service
        .list_resource_servers(service.default_page_size() as i64, 0)
        .await?;
    info!(
        resource_servers = servers.total_results,
        default_delimiter = %service.config().default_delimiter,
        "Hierarchy service ready"
    );

    tokio::signal::ctrl_c().await?;

    info!("Permtree server stopped.");
    Ok(())
}
