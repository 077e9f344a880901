//! Run orchestration across partitions
//!
//! This module contains the top-level crawl loop:
//! - Creating (and optionally warming up) the HTTP session
//! - Crawling partitions one at a time, in order
//! - Spacing partitions with the inter-partition delay
//! - Aggregating records and per-partition reports

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::fetcher::HttpSession;
use crate::crawler::listing::{ListingPageCrawler, PartitionReport};
use crate::crawler::rate_limiter::{sleep_cancellable, RateLimiter};
use crate::record::Record;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// All records, grouped by partition in crawl order
    pub records: Vec<Record>,
    pub partitions: Vec<PartitionReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    pub fn total_pages(&self) -> u32 {
        self.partitions.iter().map(|p| p.pages_fetched).sum()
    }

    pub fn total_detail_failures(&self) -> usize {
        self.partitions.iter().map(|p| p.detail_failures).sum()
    }

    pub fn total_filtered(&self) -> usize {
        self.partitions.iter().map(|p| p.filtered_out).sum()
    }

    /// Partitions that ended because a search page could not be fetched
    pub fn failed_partitions(&self) -> impl Iterator<Item = &PartitionReport> {
        self.partitions.iter().filter(|p| p.termination.is_failure())
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Crawls a list of partitions sequentially
#[derive(Debug)]
pub struct PartitionOrchestrator {
    crawler: ListingPageCrawler,
    crawler_config: CrawlerConfig,
    user_agents: UserAgentConfig,
    inter_partition: RateLimiter,
    warm_up: bool,
}

impl PartitionOrchestrator {
    /// Creates an orchestrator from the run configuration
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        Ok(Self {
            crawler: ListingPageCrawler::from_config(config)?,
            crawler_config: config.crawler.clone(),
            user_agents: config.user_agent.clone(),
            inter_partition: RateLimiter::inter_partition(&config.crawler),
            warm_up: config.site.warm_up,
        })
    }

    /// Runs the crawl over `partitions`
    ///
    /// # Arguments
    ///
    /// * `partitions` - Partition keys in crawl order
    /// * `cancel` - Stops the run at the next fetch or wait
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run finished or was cancelled; partition
    ///   failures are recorded in the report
    /// * `Err(HarvestError)` - The HTTP session could not be created
    pub async fn run(
        &self,
        partitions: &[String],
        cancel: &CancellationToken,
    ) -> Result<CrawlReport, HarvestError> {
        let started_at = Utc::now();
        let session = HttpSession::new(&self.crawler_config, &self.user_agents)?;

        if self.warm_up && !cancel.is_cancelled() {
            session.warm_up(self.crawler.site_root(), cancel).await;
        }

        let mut records = Vec::new();
        let mut reports = Vec::with_capacity(partitions.len());

        for (index, partition) in partitions.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            if index > 0 {
                let delay = self.inter_partition.next_delay();
                tracing::info!(
                    "Waiting {:.1}s before partition {}",
                    delay.as_secs_f64(),
                    partition
                );
                if !sleep_cancellable(delay, cancel).await {
                    break;
                }
            }

            let crawl = self.crawler.crawl_partition(&session, partition, cancel).await;
            records.extend(crawl.records);
            reports.push(crawl.report);
        }

        let cancelled = cancel.is_cancelled();
        let report = CrawlReport {
            records,
            partitions: reports,
            started_at,
            finished_at: Utc::now(),
            cancelled,
        };

        tracing::info!(
            partitions = report.partitions.len(),
            records = report.total_records(),
            pages = report.total_pages(),
            failures = report.total_detail_failures(),
            cancelled,
            "Crawl finished"
        );

        Ok(report)
    }
}
