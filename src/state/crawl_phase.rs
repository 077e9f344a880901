/// Phase definitions for the per-partition crawl state machine
use std::fmt;

/// The phase a partition crawl is in
///
/// ```text
/// FetchingSearchPage -> ExtractingLinks -> FetchingDetailPages -> CheckingPagination
///         ^                                                              |
///         +--------------------------------------------------------------+
/// ```
///
/// Every phase may also move straight to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Fetching the current search-results page
    FetchingSearchPage,

    /// Collecting detail links from the fetched search page
    ExtractingLinks,

    /// Fetching and extracting the newly discovered detail pages
    FetchingDetailPages,

    /// Deciding whether another search page follows
    CheckingPagination,

    /// The partition is finished
    Done,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (self, next) {
            (Done, _) => false,
            (_, Done) => true,
            (FetchingSearchPage, ExtractingLinks) => true,
            (ExtractingLinks, FetchingDetailPages) => true,
            (FetchingDetailPages, CheckingPagination) => true,
            (CheckingPagination, FetchingSearchPage) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchingSearchPage => "fetching_search_page",
            Self::ExtractingLinks => "extracting_links",
            Self::FetchingDetailPages => "fetching_detail_pages",
            Self::CheckingPagination => "checking_pagination",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
