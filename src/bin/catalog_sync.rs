use anyhow::{Context, Result};
use catalog_sync::repository::{MemoryRepository, PgRepository, Repository};
use catalog_sync::sync::PacingPolicy;
use catalog_sync::util::env;
use catalog_sync::{CatalogSynchronizer, SyncConfig, COMPLETION_MESSAGE};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "catalog_sync", version, about = "Storefront catalog sync CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Fetch the first catalog page and create any games not yet stored
    Populate {
        /// Keep everything in memory; no database required
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Override SYNC_CONCURRENCY
        #[arg(long)]
        concurrency: Option<usize>,
        /// Override SYNC_ITEM_DELAY_MS
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Override SYNC_PACING (after-finish | between-starts)
        #[arg(long)]
        pacing: Option<PacingPolicy>,
        /// Override SYNC_GALLERY_LIMIT
        #[arg(long)]
        gallery_limit: Option<usize>,
        /// Print the run report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Apply pending database migrations
    Migrate,
}

async fn connect() -> Result<PgRepository> {
    let url = env::db_url()?;
    let max_connections: u32 = env::env_parse("DB_MAX_CONNS", 5u32);
    PgRepository::connect(&url, max_connections).await
}

#[tokio::main]
async fn main() -> Result<()> {
    catalog_sync::tracing::init_tracing("info,catalog_sync=info")?;
    env::bootstrap_cli("catalog_sync");

    match Cli::parse().command {
        Commands::Migrate => {
            connect().await?.migrate().await?;
            info!("migrations applied");
        }
        Commands::Populate {
            dry_run,
            concurrency,
            delay_ms,
            pacing,
            gallery_limit,
            json,
        } => {
            let mut config = SyncConfig::from_env();
            if let Some(n) = concurrency {
                config.concurrency = n.max(1);
            }
            if let Some(ms) = delay_ms {
                config.item_delay = Duration::from_millis(ms);
            }
            if let Some(p) = pacing {
                config.pacing = p;
            }
            if let Some(n) = gallery_limit {
                config.gallery_limit = n;
            }

            let repo: Arc<dyn Repository> = if dry_run {
                info!("dry run: using in-memory repository");
                Arc::new(MemoryRepository::new())
            } else {
                Arc::new(connect().await?)
            };

            let synchronizer = CatalogSynchronizer::from_config(config, repo)?;
            let report = synchronizer.run().await?;
            if json {
                let out = serde_json::to_string_pretty(&report).context("serialize report")?;
                println!("{out}");
            }
            println!("{COMPLETION_MESSAGE}");
        }
    }

    Ok(())
}
