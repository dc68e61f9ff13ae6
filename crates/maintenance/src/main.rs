//! Maintenance commands for the property catalogue.
//!
//! **Usage:**
//! ```bash
//! campos-maintenance backfill-slugs
//! campos-maintenance backfill-keywords
//! campos-maintenance ping-existing [--force]
//! ```

use std::sync::Arc;

use anyhow::Context;
use campos_core::service::DEFAULT_MAX_GENERATION_ATTEMPTS;
use campos_indexing::{PingSettings, SearchPinger};
use campos_maintenance::{
    backfill_keywords, backfill_slugs, canonical_urls, ping_existing, Pacing,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "campos-maintenance")]
#[command(about = "Backfill derived property fields and re-announce URLs to search engines")]
struct Args {
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assign a slug to every property without one.
    BackfillSlugs,

    /// Recompute keywords, saving only properties whose keywords changed.
    BackfillKeywords,

    /// Notify search engines of every canonical property URL.
    PingExisting {
        /// Public site origin used to build canonical URLs.
        #[arg(long, env = "FRONTEND_ORIGIN", default_value = "http://localhost:5173")]
        site: String,

        #[arg(long, env = "INDEXNOW_KEY")]
        indexnow_key: Option<String>,

        /// Send pings even when SEARCH_PING_ENABLED is not set.
        #[arg(long)]
        force: bool,

        #[arg(long, env = "SEARCH_PING_ENABLED")]
        enabled: bool,

        /// URLs per notification.
        #[arg(long, default_value_t = 100)]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let pool = campos_db::create_pool(&args.database_url)
        .await
        .context("Failed to connect to database")?;
    let store = campos_db::property_store(pool);

    match args.command {
        Command::BackfillSlugs => {
            let report = backfill_slugs(store.as_ref(), DEFAULT_MAX_GENERATION_ATTEMPTS).await?;
            tracing::info!(scanned = report.scanned, updated = report.updated, "Slug backfill done");
        }
        Command::BackfillKeywords => {
            let report = backfill_keywords(store.as_ref()).await?;
            tracing::info!(
                scanned = report.scanned,
                updated = report.updated,
                "Keyword backfill done"
            );
        }
        Command::PingExisting {
            site,
            indexnow_key,
            force,
            enabled,
            batch_size,
        } => {
            let settings = PingSettings::new(&site, indexnow_key, enabled || force);
            if !settings.enabled {
                tracing::warn!("Search pings are disabled; pass --force to send them anyway");
            }
            let notifier = Arc::new(SearchPinger::new(settings));

            let urls = canonical_urls(store.as_ref(), &site).await?;
            tracing::info!(count = urls.len(), "Pinging existing property URLs");

            let pacing = Pacing {
                batch_size,
                ..Pacing::default()
            };
            let report = ping_existing(notifier.as_ref(), &urls, pacing).await;
            tracing::info!(
                total = report.total,
                notified = report.notified,
                failed = report.failed.len(),
                "Ping run done"
            );
        }
    }

    Ok(())
}
