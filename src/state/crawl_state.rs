use crate::record::Record;
use crate::state::CrawlPhase;
use crate::HarvestError;
use std::collections::HashSet;
use url::Url;

/// Progress of one partition crawl
///
/// Created when the partition starts and consumed when it ends. The seen-URL
/// set only grows, so a detail page is fetched at most once per partition.
#[derive(Debug, Clone)]
pub struct CrawlState {
    partition: String,
    phase: CrawlPhase,
    current_page: u32,
    seen_urls: HashSet<String>,
    collected: Vec<Record>,
    pages_fetched: u32,
    detail_failures: usize,
    filtered_out: usize,
}

impl CrawlState {
    /// Creates the state for a fresh partition, positioned on page 1
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            phase: CrawlPhase::FetchingSearchPage,
            current_page: 1,
            seen_urls: HashSet::new(),
            collected: Vec::new(),
            pages_fetched: 0,
            detail_failures: 0,
            filtered_out: 0,
        }
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves the state machine to `next`
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidTransition`] if the move is not allowed
    /// from the current phase.
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::trace!(
            partition = %self.partition,
            from = %self.phase,
            to = %next,
            "Crawl phase transition"
        );
        self.phase = next;
        Ok(())
    }

    /// 1-based index of the search page being crawled
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn advance_page(&mut self) {
        self.current_page += 1;
    }

    /// Records `url` as seen
    ///
    /// Returns true if the URL was not seen before in this partition.
    pub fn mark_seen(&mut self, url: &Url) -> bool {
        self.seen_urls.insert(url.as_str().to_string())
    }

    pub fn seen_count(&self) -> usize {
        self.seen_urls.len()
    }

    pub fn push_record(&mut self, record: Record) {
        self.collected.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.collected
    }

    pub fn record_search_page(&mut self) {
        self.pages_fetched += 1;
    }

    pub fn record_detail_failure(&mut self) {
        self.detail_failures += 1;
    }

    pub fn record_filtered(&mut self) {
        self.filtered_out += 1;
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn detail_failures(&self) -> usize {
        self.detail_failures
    }

    pub fn filtered_out(&self) -> usize {
        self.filtered_out
    }

    /// Consumes the state, returning the collected records in order
    pub fn into_records(self) -> Vec<Record> {
        self.collected
    }
}
