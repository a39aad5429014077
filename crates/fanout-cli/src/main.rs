#[cfg(feature = "browser")]
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "browser")]
use fanout_client::BrowserFetcher;
use fanout_client::{HtmlProductExtractor, ReqwestFetcher};
use fanout_core::config::generate_worker_id;
use fanout_core::{
    AppError, CoordinationConfig, Coordinator, DedupScope, FetchRouter, Fetcher, Iteration,
    KeySpace, StrategyRegistry, TracingWorkerReporter, WorkerConfig, WorkerService,
};
use fanout_store::{Store, StoreConfig};

#[derive(Parser)]
#[command(name = "fanout", version, about = "Distributed product crawler coordinated through Redis")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Redis connection URL
    #[arg(long, env = "REDIS_URL", global = true)]
    redis_url: Option<String>,

    /// Prefix of every coordination key; must match the server and other workers
    #[arg(long, env = "FANOUT_KEY_PREFIX", default_value = "crawler", global = true)]
    key_prefix: String,

    /// Dedup scope: "global" or "per-session"; must match the server
    #[arg(long, env = "FANOUT_DEDUP_SCOPE", default_value = "global", global = true)]
    dedup_scope: DedupScope,
}

#[derive(Args)]
struct FetchArgs {
    /// Page fetch timeout in seconds
    #[arg(long, env = "FANOUT_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    fetch_timeout_secs: u64,

    /// Domain (and its subdomains) that needs headless rendering; repeatable
    #[arg(long = "render-domain", env = "FANOUT_RENDER_DOMAINS", value_delimiter = ',')]
    render_domains: Vec<String>,

    /// Chrome/Chromium binary used for rendering
    #[cfg(feature = "browser")]
    #[arg(long, env = "CHROME_BIN")]
    chrome_bin: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a worker until Ctrl-C
    Worker {
        /// Identity published in the worker registry (generated if absent)
        #[arg(long, env = "FANOUT_WORKER_ID")]
        worker_id: Option<String>,

        /// How long one queue pop may block, in seconds
        #[arg(long, env = "FANOUT_POP_TIMEOUT_SECS", default_value_t = 10)]
        pop_timeout_secs: u64,

        /// Extra sleep after an empty pop, in seconds
        #[arg(long, env = "FANOUT_IDLE_BACKOFF_SECS", default_value_t = 5)]
        idle_backoff_secs: u64,

        /// Also write results into the legacy global collection
        #[arg(
            long,
            env = "FANOUT_MIRROR_LEGACY_RESULTS",
            default_value_t = true,
            action = clap::ArgAction::Set
        )]
        mirror_legacy_results: bool,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Open a session for the given URLs
    Submit {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Show results for one session, or the legacy global collection
    Results {
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Show queue depth, visited count and result counts
    Progress,

    /// List every session with its completion counts
    Sessions,

    /// Show the last status published by every worker
    Workers,

    /// Crawl URLs in this process against an in-memory store and print the results
    Crawl {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Number of in-process workers
        #[arg(short = 'n', long, default_value_t = 4)]
        workers: usize,

        #[command(flatten)]
        fetch: FetchArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fanout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let coordination = cli.store.coordination()?;

    match cli.command {
        Commands::Worker {
            worker_id,
            pop_timeout_secs,
            idle_backoff_secs,
            mirror_legacy_results,
            fetch,
        } => {
            let config = WorkerConfig::default()
                .with_worker_id(worker_id.unwrap_or_else(generate_worker_id))
                .with_pop_timeout(Duration::from_secs(pop_timeout_secs))
                .with_idle_backoff(Duration::from_secs(idle_backoff_secs))
                .with_mirror_legacy_results(mirror_legacy_results);
            let store = cli.store.connect().await?;
            cmd_worker(store, &coordination, config, &fetch).await?;
        }
        Commands::Submit { urls } => {
            let coordinator = Coordinator::new(cli.store.connect().await?, &coordination);
            print_json(&coordinator.submit(urls).await?)?;
        }
        Commands::Results { session } => {
            let coordinator = Coordinator::new(cli.store.connect().await?, &coordination);
            let results = match session {
                Some(id) => coordinator.get_session_results(&id).await?,
                None => coordinator.get_results().await?,
            };
            print_json(&results)?;
        }
        Commands::Progress => {
            let coordinator = Coordinator::new(cli.store.connect().await?, &coordination);
            print_json(&coordinator.get_progress().await?)?;
        }
        Commands::Sessions => {
            let coordinator = Coordinator::new(cli.store.connect().await?, &coordination);
            print_json(&coordinator.list_sessions().await?)?;
        }
        Commands::Workers => {
            let coordinator = Coordinator::new(cli.store.connect().await?, &coordination);
            print_json(&coordinator.get_workers().await?)?;
        }
        Commands::Crawl {
            urls,
            workers,
            fetch,
        } => {
            cmd_crawl(urls, workers.max(1), &coordination, &fetch).await?;
        }
    }

    Ok(())
}

impl StoreArgs {
    fn coordination(&self) -> Result<CoordinationConfig> {
        let prefix = self.key_prefix.trim();
        if prefix.is_empty() {
            anyhow::bail!("--key-prefix must not be empty");
        }
        Ok(CoordinationConfig {
            keys: KeySpace::new(prefix),
            dedup_scope: self.dedup_scope,
        })
    }

    async fn connect(&self) -> Result<Store> {
        let config = StoreConfig::from_url(self.redis_url.clone())?;
        Store::redis(&config)
            .await
            .with_context(|| format!("Failed to connect to {}", config.url))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Fetcher selection
// ---------------------------------------------------------------------------

/// The fetcher a CLI worker runs with, depending on build features and
/// whether any domain needs rendering.
#[derive(Clone)]
enum CliFetcher {
    Plain(FetchRouter<ReqwestFetcher>),
    #[cfg(feature = "browser")]
    Rendering(FetchRouter<ReqwestFetcher, BrowserFetcher>),
}

impl Fetcher for CliFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        match self {
            CliFetcher::Plain(router) => router.fetch(url).await,
            #[cfg(feature = "browser")]
            CliFetcher::Rendering(router) => router.fetch(url).await,
        }
    }
}

async fn build_fetcher(args: &FetchArgs) -> Result<CliFetcher> {
    let timeout = Duration::from_secs(args.fetch_timeout_secs);
    let plain = ReqwestFetcher::with_timeout(timeout).context("Failed to create HTTP client")?;
    let registry = StrategyRegistry::rendering(&args.render_domains);

    #[cfg(feature = "browser")]
    if !registry.is_empty() {
        let browser = BrowserFetcher::launch(timeout, args.chrome_bin.as_deref())
            .await
            .context("Failed to launch headless browser")?;
        return Ok(CliFetcher::Rendering(FetchRouter::with_renderer(
            registry, plain, browser,
        )));
    }

    #[cfg(not(feature = "browser"))]
    if !registry.is_empty() {
        tracing::warn!(
            domains = ?args.render_domains,
            "Built without the `browser` feature; rendered domains use plain fetch"
        );
    }

    Ok(CliFetcher::Plain(FetchRouter::plain_only(registry, plain)))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_worker(
    store: Store,
    coordination: &CoordinationConfig,
    config: WorkerConfig,
    fetch: &FetchArgs,
) -> Result<()> {
    let fetcher = build_fetcher(fetch).await?;
    let worker = WorkerService::new(
        store,
        coordination,
        fetcher,
        HtmlProductExtractor::new(),
        config,
    );

    let cancel = CancellationToken::new();
    tokio::spawn(handle_ctrl_c(cancel.clone()));

    worker.run(cancel, &TracingWorkerReporter).await?;
    Ok(())
}

async fn handle_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Shutdown signal received, finishing current task");
            cancel.cancel();
        }
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
    }
}

/// Submit `urls` to a fresh in-memory store, drain the queue with
/// `workers` in-process workers, and print the session's results.
async fn cmd_crawl(
    urls: Vec<String>,
    workers: usize,
    coordination: &CoordinationConfig,
    fetch: &FetchArgs,
) -> Result<()> {
    let store = Store::memory();
    let coordinator = Coordinator::new(store.clone(), coordination);
    let fetcher = build_fetcher(fetch).await?;

    let outcome = coordinator.submit(urls).await?;

    let mut handles = Vec::with_capacity(workers);
    for i in 0..workers {
        let worker = WorkerService::new(
            store.clone(),
            coordination,
            fetcher.clone(),
            HtmlProductExtractor::new(),
            WorkerConfig::default()
                .with_worker_id(format!("crawl-{i}"))
                .with_pop_timeout(Duration::from_millis(200)),
        );
        // Everything is enqueued up front, so an empty pop means the queue is drained.
        handles.push(tokio::spawn(async move {
            loop {
                if worker.run_once(&TracingWorkerReporter).await? == Iteration::Empty {
                    return Ok::<_, AppError>(());
                }
            }
        }));
    }
    for handle in handles {
        handle.await.context("Worker task panicked")??;
    }

    print_json(&coordinator.get_session_results(&outcome.session_id).await?)?;
    Ok(())
}
