//! Per-partition crawl over paginated search results
//!
//! [`ListingPageCrawler`] drives the [`CrawlPhase`] state machine for one
//! partition: fetch a search page, collect new detail links, fetch and
//! extract each detail page, then decide whether to continue to the next
//! search page. Problems with individual pages end or shorten the partition
//! but never fail it.

use crate::config::Config;
use crate::crawler::fetcher::{FetchOutcome, HttpSession, RetryingFetcher};
use crate::crawler::pagination::{detector_for, NextPageDetector};
use crate::crawler::parser::parse_search_page;
use crate::extract::{ExtractionContext, FieldExtractor};
use crate::filter::RecordFilter;
use crate::record::Record;
use crate::state::{CrawlPhase, CrawlState, Termination};
use crate::url::{partition_display_name, SearchUrlBuilder};
use crate::{ConfigError, HarvestError};
use regex::Regex;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Summary of one partition crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionReport {
    /// Display name of the partition
    pub partition: String,
    pub records_collected: usize,
    pub pages_fetched: u32,
    pub detail_failures: usize,
    /// Records rejected by the configured filters
    pub filtered_out: usize,
    pub termination: Termination,
}

/// Records and report for one partition
#[derive(Debug, Clone)]
pub struct PartitionCrawl {
    pub records: Vec<Record>,
    pub report: PartitionReport,
}

/// Crawls the search results of a single partition
#[derive(Debug)]
pub struct ListingPageCrawler {
    fetcher: RetryingFetcher,
    extractor: FieldExtractor,
    search_urls: SearchUrlBuilder,
    detail_pattern: Regex,
    detector: Box<dyn NextPageDetector>,
    filter: RecordFilter,
    max_pages: u32,
    max_listings_per_page: usize,
}

impl ListingPageCrawler {
    /// Builds a crawler from the run configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL or the detail pattern
    /// cannot be compiled.
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let search_urls = SearchUrlBuilder::new(&config.site)?;
        let detail_pattern = Regex::new(&config.site.detail_path_pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("detail-path-pattern: {}", e))
        })?;

        Ok(Self {
            fetcher: RetryingFetcher::from_config(&config.crawler),
            extractor: FieldExtractor::new(),
            search_urls,
            detail_pattern,
            detector: detector_for(config.crawler.pagination),
            filter: RecordFilter::from_config(&config.filters),
            max_pages: config.crawler.max_pages_per_partition.max(1),
            max_listings_per_page: config.crawler.max_listings_per_page,
        })
    }

    /// The site root, used for session warm-up
    pub fn site_root(&self) -> &Url {
        self.search_urls.base()
    }

    /// Crawls every search page of `partition`
    ///
    /// # Arguments
    ///
    /// * `session` - The run's HTTP session
    /// * `partition` - Partition key as configured (e.g. `"iredell"`)
    /// * `cancel` - Checked before every fetch
    ///
    /// # Returns
    ///
    /// The records collected in discovery order plus a report of why the
    /// partition ended. An unreachable partition yields zero records.
    pub async fn crawl_partition(
        &self,
        session: &HttpSession,
        partition: &str,
        cancel: &CancellationToken,
    ) -> PartitionCrawl {
        let mut state = CrawlState::new(partition_display_name(partition));
        tracing::info!("Crawling partition {}", state.partition());

        let termination = match self.drive(session, partition, &mut state, cancel).await {
            Ok(termination) => termination,
            Err(e) => {
                tracing::error!(
                    partition = %state.partition(),
                    phase = %state.phase(),
                    "Partition aborted: {}",
                    e
                );
                if state.pages_fetched() == 0 {
                    Termination::FirstPageUnavailable
                } else {
                    Termination::PageUnavailable
                }
            }
        };

        let report = PartitionReport {
            partition: state.partition().to_string(),
            records_collected: state.records().len(),
            pages_fetched: state.pages_fetched(),
            detail_failures: state.detail_failures(),
            filtered_out: state.filtered_out(),
            termination,
        };

        tracing::info!(
            partition = %report.partition,
            records = report.records_collected,
            pages = report.pages_fetched,
            failures = report.detail_failures,
            filtered = report.filtered_out,
            termination = %report.termination,
            "Partition finished"
        );

        PartitionCrawl {
            records: state.into_records(),
            report,
        }
    }

    async fn drive(
        &self,
        session: &HttpSession,
        partition: &str,
        state: &mut CrawlState,
        cancel: &CancellationToken,
    ) -> Result<Termination, HarvestError> {
        loop {
            // FetchingSearchPage
            if cancel.is_cancelled() {
                return finish(state, Termination::Cancelled);
            }

            let page = state.current_page();
            let page_url = self.search_urls.page_url(partition, page)?;
            tracing::info!(partition = %state.partition(), page, url = %page_url, "Fetching search page");

            let (body, final_url) = match self.fetcher.fetch(session, &page_url, cancel).await {
                FetchOutcome::Success {
                    body, final_url, ..
                } => (body, final_url),
                FetchOutcome::Cancelled => return finish(state, Termination::Cancelled),
                outcome => {
                    let termination = if page == 1 {
                        Termination::FirstPageUnavailable
                    } else {
                        Termination::PageUnavailable
                    };
                    tracing::warn!(
                        partition = %state.partition(),
                        page,
                        "Search page unavailable: {}",
                        outcome.describe()
                    );
                    return finish(state, termination);
                }
            };
            state.record_search_page();

            // ExtractingLinks
            state.transition(CrawlPhase::ExtractingLinks)?;
            let search = parse_search_page(
                &body,
                &final_url,
                &self.detail_pattern,
                self.detector.as_ref(),
            );

            let found = search.detail_links.len();
            let new_links: Vec<Url> = search
                .detail_links
                .into_iter()
                .filter(|link| state.mark_seen(link))
                .take(self.max_listings_per_page)
                .collect();

            tracing::debug!(
                partition = %state.partition(),
                page,
                found,
                new = new_links.len(),
                seen = state.seen_count(),
                "Collected detail links"
            );

            if new_links.is_empty() {
                return finish(state, Termination::NoListings);
            }

            // FetchingDetailPages
            state.transition(CrawlPhase::FetchingDetailPages)?;
            for link in new_links {
                if cancel.is_cancelled() {
                    return finish(state, Termination::Cancelled);
                }

                match self.fetcher.fetch(session, &link, cancel).await {
                    FetchOutcome::Success { body, .. } => {
                        let context = ExtractionContext::now(state.partition());
                        let record = self.extractor.extract_html(&body, &link, &context);

                        if self.filter.accepts(&record) {
                            state.push_record(record);
                        } else {
                            tracing::debug!(url = %link, "Record rejected by filters");
                            state.record_filtered();
                        }
                    }
                    FetchOutcome::Cancelled => return finish(state, Termination::Cancelled),
                    outcome => {
                        tracing::warn!(url = %link, "Skipping detail page: {}", outcome.describe());
                        state.record_detail_failure();
                    }
                }
            }

            // CheckingPagination
            state.transition(CrawlPhase::CheckingPagination)?;
            if !search.has_next_page {
                return finish(state, Termination::NoNextPage);
            }
            if page >= self.max_pages {
                tracing::info!(partition = %state.partition(), page, "Page ceiling reached");
                return finish(state, Termination::PageCeiling);
            }

            state.transition(CrawlPhase::FetchingSearchPage)?;
            state.advance_page();
        }
    }
}

fn finish(state: &mut CrawlState, termination: Termination) -> Result<Termination, HarvestError> {
    state.transition(CrawlPhase::Done)?;
    Ok(termination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn create_test_config(extra: &str) -> Config {
        let toml = format!(
            r#"
partitions = ["iredell"]

[site]
base-url = "https://www.bizbuysell.com"
region = "NC"

[user-agent]
pool = ["TestAgent/1.0"]

[output]
backup-path = "listings.json"
database-path = "listings.db"
summary-path = "summary.md"

{}
"#,
            extra
        );
        parse_config(&toml).unwrap()
    }

    #[test]
    fn test_from_config() {
        let crawler = ListingPageCrawler::from_config(&create_test_config("")).unwrap();
        assert_eq!(crawler.site_root().as_str(), "https://www.bizbuysell.com/");
        assert_eq!(crawler.max_pages, 20);
        assert_eq!(crawler.max_listings_per_page, 10);
        assert!(crawler.filter.is_empty());
    }

    #[test]
    fn test_from_config_with_filters() {
        let crawler = ListingPageCrawler::from_config(&create_test_config(
            "[filters]\nmin-price = 50000\n",
        ))
        .unwrap();
        assert!(!crawler.filter.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let config = create_test_config("");
        let crawler = ListingPageCrawler::from_config(&config).unwrap();
        let session = HttpSession::new(&config.crawler, &config.user_agent).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let crawl = crawler.crawl_partition(&session, "iredell", &cancel).await;
        assert!(crawl.records.is_empty());
        assert_eq!(crawl.report.partition, "Iredell");
        assert_eq!(crawl.report.pages_fetched, 0);
        assert_eq!(crawl.report.termination, Termination::Cancelled);
    }
}
