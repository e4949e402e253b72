//! Living Wage Crawler main entry point
//!
//! Command-line interface: `crawl` harvests wage records from the site,
//! `aggregate` summarizes a records file by state.

use anyhow::Context;
use clap::{Parser, Subcommand};
use living_wage_crawler::config::{load_config_with_hash, seed_urls, Config};
use living_wage_crawler::crawler::{CrawlEngine, HttpFetcher, ResponseCache};
use living_wage_crawler::output::{
    aggregate, print_aggregation, read_records, render_sample, RecordWriter,
};
use living_wage_crawler::url::seed_kind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Living Wage Crawler: a polite harvester for living wage tables
#[derive(Parser, Debug)]
#[command(name = "living-wage-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Harvests living wage tables by county and metro", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the site from the configured seeds and write wage records
    Crawl {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Records file to write (overrides output.records-path)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Bypass the response cache for this run
        #[arg(long, conflicts_with = "clear_cache")]
        no_cache: bool,

        /// Empty the response cache before crawling
        #[arg(long)]
        clear_cache: bool,

        /// Validate config and show the seeds without crawling
        #[arg(long)]
        dry_run: bool,
    },

    /// Count county records per state in a records file
    Aggregate {
        /// Records file (.json array or .jsonl)
        #[arg(value_name = "RECORDS")]
        records: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl {
            config,
            output,
            no_cache,
            clear_cache,
            dry_run,
        } => handle_crawl(&config, output, no_cache, clear_cache, dry_run).await,
        Command::Aggregate { records, json } => handle_aggregate(&records, json),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("living_wage_crawler=info,warn"),
            1 => EnvFilter::new("living_wage_crawler=debug,info"),
            2 => EnvFilter::new("living_wage_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs a crawl and streams its records to the output file
async fn handle_crawl(
    config_path: &Path,
    output: Option<PathBuf>,
    no_cache: bool,
    clear_cache: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    tracing::info!("Loading configuration from: {}", config_path.display());
    let (mut config, config_hash) = load_config_with_hash(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if no_cache {
        config.cache.enabled = false;
    }
    let output_path = output.unwrap_or_else(|| PathBuf::from(&config.output.records_path));
    let seeds = seed_urls(&config)?;

    if dry_run {
        print_dry_run(&config, &seeds, &output_path);
        return Ok(());
    }

    if clear_cache && config.cache.enabled {
        let cache = ResponseCache::open(Path::new(&config.cache.path))?;
        let removed = cache.clear()?;
        tracing::info!("Cleared {} cached responses from {}", removed, config.cache.path);
    }

    let fetcher = Arc::new(HttpFetcher::from_config(&config)?);
    let mut writer = RecordWriter::create(&output_path)
        .with_context(|| format!("Cannot create records file {}", output_path.display()))?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches");
            interrupt.cancel();
        }
    });

    let engine = CrawlEngine::new(fetcher, config.crawler.clone());
    let mut run = engine.crawl(seeds, cancel);

    while let Some(record) = run.next_record().await {
        if !record.is_aligned() {
            tracing::debug!("Column count mismatch in {}", record.source_url);
        }
        writer.write(&record)?;
    }

    let written = writer.finish()?;
    let stats = run.finish().await;

    tracing::info!("Wrote {} records to {}", written, output_path.display());
    if stats.cancelled {
        tracing::warn!(
            "Crawl was interrupted; {} URLs were never fetched",
            stats.frontier_remaining
        );
    }

    Ok(())
}

fn print_dry_run(config: &Config, seeds: &[url::Url], output_path: &Path) {
    println!("=== Living Wage Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Minimum delay: {}ms", config.crawler.minimum_delay);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nCache:");
    if config.cache.enabled {
        println!("  Path: {}", config.cache.path);
    } else {
        println!("  Disabled");
    }

    println!("\nOutput: {}", output_path.display());

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        match seed_kind(seed) {
            Some(kind) => println!("  - {} ({:?})", seed, kind),
            None => println!("  - {}", seed),
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Aggregates a records file and prints the result
fn handle_aggregate(records_path: &Path, json: bool) -> anyhow::Result<()> {
    let records = read_records(records_path)
        .with_context(|| format!("Failed to read records from {}", records_path.display()))?;
    tracing::info!("Loaded {} records from {}", records.len(), records_path.display());

    let result = aggregate(&records);

    if json {
        if let Some(first) = records.first() {
            tracing::info!("Sample record: {}", serde_json::to_string(first)?);
        }
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if let Some(first) = records.first() {
            print!("{}", render_sample(first));
        }
        print_aggregation(&result);
    }

    Ok(())
}
