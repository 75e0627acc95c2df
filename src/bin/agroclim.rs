use agroclim::{
    write_daily_csv, write_manifest, write_summary_csv, CachedFetcher, FileFetcher, HttpFetcher,
    Pipeline, PipelineConfig, Provider, RawFetch, SiteRegistry, StrategyKind,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "agroclim", version, about = "Agro-climate interval summaries for field sites")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, derive and summarize every site of a registry.
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Site registry (.csv or .json).
    #[arg(long)]
    sites: PathBuf,

    /// daymet, nasa-power or chirps.
    #[arg(long)]
    provider: Provider,

    /// Read provider extracts `<dir>/<site_id>.csv` instead of calling the provider API.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Parquet cache for raw payloads (defaults to the user cache dir for API fetches).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Do not cache raw payloads.
    #[arg(long, conflicts_with = "cache_dir")]
    no_cache: bool,

    /// JSON run configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Number of intervals for the even strategy.
    #[arg(long)]
    intervals: Option<usize>,

    /// Days before planting to include.
    #[arg(long)]
    lookback: Option<u32>,

    #[arg(long)]
    concurrency: Option<usize>,

    #[arg(long)]
    strict: bool,

    /// Summary table output.
    #[arg(long)]
    out: PathBuf,

    /// Daily table output.
    #[arg(long)]
    daily_out: Option<PathBuf>,

    /// Per-site status output (JSON).
    #[arg(long)]
    manifest: Option<PathBuf>,
}

impl RunArgs {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(n) = self.intervals {
            config.even_intervals = n;
        }
        if let Some(days) = self.lookback {
            config.lookback_days = days;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        config.strict |= self.strict;
        config.validate()?;
        Ok(config)
    }
}

async fn execute<F: RawFetch>(
    fetcher: F,
    args: &RunArgs,
    config: PipelineConfig,
    registry: &SiteRegistry,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::builder()
        .fetcher(fetcher)
        .provider(args.provider)
        .config(config)
        .build();
    let result = pipeline.run_batch(registry).await;

    write_summary_csv(&args.out, &result.summaries)?;
    if let Some(path) = &args.daily_out {
        write_daily_csv(path, &result.records)?;
    }
    if let Some(path) = &args.manifest {
        write_manifest(path, &result.manifest)?;
    }

    for (site, reason) in result.manifest.failed() {
        log::warn!("Site {} failed: {}", site, reason);
    }
    if !registry.is_empty() && result.manifest.succeeded() == 0 {
        bail!("every site failed; see the log or the manifest for reasons");
    }
    Ok(())
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = args.pipeline_config()?;
    let registry = SiteRegistry::from_path(&args.sites)
        .with_context(|| format!("loading sites from {}", args.sites.display()))?;
    log::info!("Loaded {} site(s) for {}", registry.len(), args.provider);

    match (&args.data_dir, &args.cache_dir, args.no_cache) {
        (Some(dir), None, _) | (Some(dir), _, true) => {
            execute(FileFetcher::new(dir), &args, config, &registry).await
        }
        (Some(dir), Some(cache), false) => {
            let fetcher = CachedFetcher::new(FileFetcher::new(dir), cache);
            execute(fetcher, &args, config, &registry).await
        }
        (None, cache, no_cache) => {
            let http = HttpFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
            if no_cache {
                return execute(http, &args, config, &registry).await;
            }
            let fetcher = match cache {
                Some(dir) => CachedFetcher::new(http, dir),
                None => CachedFetcher::in_system_cache(http)?,
            };
            execute(fetcher, &args, config, &registry).await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run(args) => run(args).await,
    }
}
