//! Listing Harvester main entry point
//!
//! This is the command-line interface for the listing harvester.

use anyhow::{bail, Context};
use clap::Parser;
use listing_harvester::config::{load_config_with_hash, Config};
use listing_harvester::crawler::{crawl, CrawlReport};
use listing_harvester::delivery::deliver;
use listing_harvester::output::{generate_markdown_summary, print_summary, BackupWriter, JsonBackup};
use listing_harvester::storage::{Publisher, RunMetadata, SqlitePublisher};
use listing_harvester::url::partition_display_name;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Listing Harvester: a polite listing-site crawler
///
/// Crawls the configured partitions of a business-for-sale site, extracts
/// one record per listing, writes a local backup, and publishes the set to
/// the configured database.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A polite listing-site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Crawl only these partitions (repeatable); must appear in the config
    #[arg(long = "partition", value_name = "KEY")]
    partitions: Vec<String>,

    /// Do not write the local backup
    #[arg(long)]
    skip_backup: bool,

    /// Do not publish to the database
    #[arg(long)]
    skip_publish: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let partitions = select_partitions(&config, &cli.partitions)?;

    if cli.dry_run {
        handle_dry_run(&config, &partitions);
        return Ok(());
    }

    let report = handle_crawl(&config, &partitions).await?;

    // Counts are reported even when a sink fails
    print_summary(&report);
    let summary_path = Path::new(&config.output.summary_path);
    let summary_result = generate_markdown_summary(&report, &config_hash, summary_path);
    if let Err(e) = &summary_result {
        tracing::error!("Failed to write summary: {}", e);
    }

    let failed_sinks = handle_sinks(&config, &config_hash, &report, &cli);

    summary_result.context("failed to write summary")?;
    if !failed_sinks.is_empty() {
        bail!("{} failed: records were not fully saved", failed_sinks.join(" and "));
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvester=info,warn"),
            1 => EnvFilter::new("listing_harvester=debug,info"),
            2 => EnvFilter::new("listing_harvester=trace,debug"),
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

/// Narrows the configured partitions to those requested on the command line
fn select_partitions(config: &Config, requested: &[String]) -> anyhow::Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(config.partitions.clone());
    }

    for key in requested {
        if !config.partitions.contains(key) {
            bail!("partition '{}' is not in the configuration", key);
        }
    }

    // Keep configuration order
    Ok(config
        .partitions
        .iter()
        .filter(|key| requested.contains(key))
        .cloned()
        .collect())
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, partitions: &[String]) {
    println!("=== Listing Harvester Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Region: {}", config.site.region);
    println!("  Detail pattern: {}", config.site.detail_path_pattern);
    println!("  Warm-up: {}", config.site.warm_up);

    println!("\nCrawler Configuration:");
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Request timeout: {}s", config.crawler.request_timeout_seconds);
    println!(
        "  Per-request delay: {}-{}s",
        config.crawler.min_delay_seconds, config.crawler.max_delay_seconds
    );
    println!(
        "  Inter-partition delay: {}-{}s",
        config.crawler.inter_partition_delay[0], config.crawler.inter_partition_delay[1]
    );
    println!("  Max pages per partition: {}", config.crawler.max_pages_per_partition);
    println!("  Max listings per page: {}", config.crawler.max_listings_per_page);
    println!("  Pagination: {:?}", config.crawler.pagination);

    println!("\nUser Agents ({}):", config.user_agent.pool.len());
    for agent in &config.user_agent.pool {
        println!("  - {}", agent);
    }

    println!("\nOutput:");
    println!("  Backup: {}", config.output.backup_path);
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nPartitions ({}):", partitions.len());
    for key in partitions {
        println!("  - {} ({})", partition_display_name(key), key);
    }

    println!("\n✓ Configuration is valid");
}

/// Runs the crawl, cancelling it on Ctrl-C
async fn handle_crawl(config: &Config, partitions: &[String]) -> anyhow::Result<CrawlReport> {
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with partial results");
            signal_token.cancel();
        }
    });

    tracing::info!("Crawling {} partitions", partitions.len());
    let report = crawl(config, partitions, &cancel).await.context("crawl failed")?;

    if report.cancelled {
        tracing::warn!("Crawl cancelled after {} records", report.total_records());
    } else {
        tracing::info!("Crawl completed with {} records", report.total_records());
    }

    Ok(report)
}

/// Writes the backup and publishes the records
///
/// Returns the names of the sinks that failed; each failure is logged.
fn handle_sinks(
    config: &Config,
    config_hash: &str,
    report: &CrawlReport,
    cli: &Cli,
) -> Vec<&'static str> {
    let mut failed = Vec::new();

    let backup = JsonBackup::new(&config.output.backup_path);
    let backup: Option<&dyn BackupWriter> = if cli.skip_backup {
        tracing::info!("Skipping backup");
        None
    } else {
        Some(&backup)
    };

    let mut publisher = None;
    if cli.skip_publish {
        tracing::info!("Skipping publish");
    } else if !report.records.is_empty() {
        match SqlitePublisher::new(Path::new(&config.output.database_path)) {
            Ok(opened) => publisher = Some(opened),
            Err(e) => {
                tracing::error!("Failed to open database: {}", e);
                failed.push("publish");
            }
        }
    }

    let run = RunMetadata::from_report(report, config_hash);
    let delivery = deliver(
        &report.records,
        backup,
        publisher.as_mut().map(|p| p as &mut dyn Publisher),
        &run,
    );

    failed.extend(delivery.failures().into_iter().map(|(name, _)| name));
    failed
}
