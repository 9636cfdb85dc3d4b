use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use jobrelay_client::adapters::Adapter;
use jobrelay_client::ingest::IngestClient;
use jobrelay_core::traits::DedupStore;
use jobrelay_core::{FetchQuery, KeywordFilter, Pipeline};
use jobrelay_db::DedupCache;

/// Search terms used when none are given on the command line.
const DEFAULT_KEYWORDS: &[&str] = &[
    "architect",
    "interior designer",
    "landscape architect",
    "urban designer",
    "BIM",
];

const DEFAULT_DEDUP_DB_PATH: &str = "data/dedup_cache.db";

#[derive(Parser)]
#[command(name = "jobrelay", version, about = "Architecture job aggregation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SearchArgs {
    /// Search keywords (defaults to the architecture/design set)
    #[arg(short, long, value_delimiter = ',')]
    keywords: Vec<String>,

    /// Location filter, honored only in single-market fetches
    #[arg(short, long, default_value = "")]
    location: String,

    /// Market selector for regional providers: "all" or comma-separated codes (e.g. "gb,us")
    #[arg(short, long, default_value = "all")]
    market: String,

    /// Maximum jobs per provider (per market for regional providers)
    #[arg(long, env = "MAX_JOBS_PER_FETCH", default_value_t = 100)]
    max_results: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, filter, dedup, and deliver jobs once
    Run {
        /// Single provider to run (adzuna, careerjet, jooble)
        #[arg(short, long, conflicts_with = "all")]
        source: Option<String>,

        /// Run every configured provider
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Run all providers on a recurring schedule
    Schedule {
        /// Hours between runs
        #[arg(long, env = "FETCH_INTERVAL_HOURS", default_value_t = 6)]
        interval_hours: u64,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Remove expired entries from the dedup cache
    Cleanup,

    /// Show dedup cache statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobrelay=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            all,
            search,
        } => {
            let adapters = resolve_adapters(source.as_deref(), all)?;
            let pipeline = build_pipeline().await?;
            run_once(&pipeline, &adapters, &build_query(&search)).await;
        }
        Commands::Schedule {
            interval_hours,
            search,
        } => {
            let adapters = resolve_adapters(None, true)?;
            let pipeline = build_pipeline().await?;
            cmd_schedule(&pipeline, &adapters, &build_query(&search), interval_hours).await;
        }
        Commands::Cleanup => {
            let cache = open_cache().await?;
            let removed = cache
                .cleanup_expired()
                .await
                .context("Failed to clean up dedup cache")?;
            println!("Removed {removed} expired entries");
        }
        Commands::Stats => {
            let cache = open_cache().await?;
            let count = cache.count().await.context("Failed to read dedup cache")?;
            println!("Dedup cache: {count} entries ({})", dedup_db_path().display());
        }
    }

    Ok(())
}

fn resolve_adapters(source: Option<&str>, all: bool) -> Result<Vec<Adapter>> {
    match (source, all) {
        (Some(name), _) => Ok(vec![Adapter::by_name(name)?]),
        (None, true) => Ok(Adapter::all_from_env()?),
        (None, false) => anyhow::bail!("Specify a provider with --source <name> or use --all"),
    }
}

fn build_query(search: &SearchArgs) -> FetchQuery {
    let keywords = if search.keywords.is_empty() {
        DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    } else {
        search.keywords.clone()
    };

    FetchQuery::new(keywords)
        .with_location(search.location.clone())
        .with_max_results(search.max_results)
        .with_market(search.market.clone())
}

fn dedup_db_path() -> PathBuf {
    std::env::var("DEDUP_DB_PATH")
        .unwrap_or_else(|_| DEFAULT_DEDUP_DB_PATH.to_string())
        .into()
}

async fn open_cache() -> Result<DedupCache> {
    DedupCache::open(&dedup_db_path())
        .await
        .context("Failed to open dedup cache")
}

/// Assemble the pipeline, failing before any provider is invoked when
/// the ingest endpoint is not configured.
async fn build_pipeline() -> Result<Pipeline<IngestClient, DedupCache>> {
    let sink = IngestClient::from_env().context("Ingest service not configured")?;
    let cache = open_cache().await?;
    let filter = KeywordFilter::new().context("Failed to compile keyword filter")?;
    Ok(Pipeline::new(sink, cache, filter))
}

async fn run_once(
    pipeline: &Pipeline<IngestClient, DedupCache>,
    adapters: &[Adapter],
    query: &FetchQuery,
) {
    let totals = pipeline.run_all(adapters, query).await;
    println!("{totals}");
}

/// Recurring serialized runs. The first run starts immediately; a run
/// that overshoots the interval delays the next tick instead of
/// stacking runs.
async fn cmd_schedule(
    pipeline: &Pipeline<IngestClient, DedupCache>,
    adapters: &[Adapter],
    query: &FetchQuery,
    interval_hours: u64,
) {
    let period = Duration::from_secs(interval_hours.max(1) * 3600);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_hours, "Scheduler started");

    loop {
        interval.tick().await;
        run_once(pipeline, adapters, query).await;
        tracing::info!(interval_hours, "Run complete, sleeping until next tick");
    }
}
