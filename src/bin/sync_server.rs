// HTTP trigger for catalog sync runs

use anyhow::Result;
use catalog_sync::api::SyncServer;
use catalog_sync::repository::PgRepository;
use catalog_sync::util::env as env_util;
use catalog_sync::{CatalogSynchronizer, SyncConfig};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<()> {
    catalog_sync::tracing::init_tracing("info,actix_web=info")?;
    env_util::bootstrap_cli("sync_server");

    let server = SyncServer::from_env();

    let database_url = env_util::db_url()?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let repo = PgRepository::connect(&database_url, max_connections).await?;
    if env_util::env_flag("DB_MIGRATE_ON_START", false) {
        repo.migrate().await?;
    }
    tracing::info!("database connected");

    let synchronizer = CatalogSynchronizer::from_config(SyncConfig::from_env(), Arc::new(repo))?;
    server.run(synchronizer).await
}
