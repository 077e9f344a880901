use std::fmt;

/// Why a partition crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// A search page listed no new detail links
    NoListings,

    /// The last search page had no "next" affordance
    NoNextPage,

    /// The per-partition page ceiling was reached
    PageCeiling,

    /// The first search page could not be fetched
    FirstPageUnavailable,

    /// A later search page could not be fetched
    PageUnavailable,

    /// The run was cancelled
    Cancelled,
}

impl Termination {
    /// Returns true if the partition ended because of a fetch failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FirstPageUnavailable | Self::PageUnavailable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoListings => "no_listings",
            Self::NoNextPage => "no_next_page",
            Self::PageCeiling => "page_ceiling",
            Self::FirstPageUnavailable => "first_page_unavailable",
            Self::PageUnavailable => "page_unavailable",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
