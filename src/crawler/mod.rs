//! Crawler module for listing discovery and retrieval
//!
//! This module contains the core crawling logic, including:
//! - Randomized request spacing
//! - HTTP fetching with retry and backoff logic
//! - Search-page parsing and pagination detection
//! - The per-partition state machine
//! - Orchestration across partitions

mod fetcher;
mod listing;
mod orchestrator;
mod pagination;
mod parser;
mod rate_limiter;

pub use fetcher::{backoff_delay, FailureCause, FetchOutcome, HttpSession, RetryPolicy, RetryingFetcher};
pub use listing::{ListingPageCrawler, PartitionCrawl, PartitionReport};
pub use orchestrator::{CrawlReport, PartitionOrchestrator};
pub use pagination::{detector_for, EitherOf, NextLinkText, NextPageDetector, RelNext};
pub use parser::{extract_detail_links, parse_search_page, SearchPage};
pub use rate_limiter::{sleep_cancellable, DelayProfile, RateLimiter};

use crate::config::Config;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl over the configured partitions
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the partition crawler from the configuration
/// 2. Create the HTTP session and optionally warm it up
/// 3. Crawl each partition in order
/// 4. Return the aggregated records and reports
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `partitions` - Partition keys to crawl, in order
/// * `cancel` - Cancellation token checked before every fetch
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed or was cancelled
/// * `Err(HarvestError)` - The crawler could not be set up
pub async fn crawl(
    config: &Config,
    partitions: &[String],
    cancel: &CancellationToken,
) -> crate::Result<CrawlReport> {
    PartitionOrchestrator::new(config)?.run(partitions, cancel).await
}
