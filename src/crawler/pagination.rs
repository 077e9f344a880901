//! "Next page" detection strategies
//!
//! Sites signal pagination in different ways, so the check is a trait with
//! one implementation per signal. The strategy is chosen in config.

use crate::config::PaginationStrategy;
use regex::Regex;
use scraper::{Html, Selector};

/// Decides whether a search-results page has a following page
pub trait NextPageDetector: Send + Sync + std::fmt::Debug {
    fn has_next_page(&self, document: &Html) -> bool;
}

/// Matches an anchor whose text reads "Next", "›" or "»" (case-insensitive)
#[derive(Debug, Clone)]
pub struct NextLinkText {
    anchors: Option<Selector>,
    text: Option<Regex>,
}

impl NextLinkText {
    pub fn new() -> Self {
        Self {
            anchors: Selector::parse("a").ok(),
            text: Regex::new(r"(?i)next|›|»").ok(),
        }
    }
}

impl Default for NextLinkText {
    fn default() -> Self {
        Self::new()
    }
}

impl NextPageDetector for NextLinkText {
    fn has_next_page(&self, document: &Html) -> bool {
        let (Some(anchors), Some(text)) = (&self.anchors, &self.text) else {
            return false;
        };

        document
            .select(anchors)
            .any(|a| text.is_match(a.text().collect::<String>().trim()))
    }
}

/// Matches `<a rel="next">` or `<link rel="next">`
#[derive(Debug, Clone)]
pub struct RelNext {
    selector: Option<Selector>,
}

impl RelNext {
    pub fn new() -> Self {
        Self {
            selector: Selector::parse("a[rel~='next'], link[rel~='next']").ok(),
        }
    }
}

impl Default for RelNext {
    fn default() -> Self {
        Self::new()
    }
}

impl NextPageDetector for RelNext {
    fn has_next_page(&self, document: &Html) -> bool {
        self.selector
            .as_ref()
            .is_some_and(|selector| document.select(selector).next().is_some())
    }
}

/// Reports a next page if any of its detectors does
#[derive(Debug)]
pub struct EitherOf {
    detectors: Vec<Box<dyn NextPageDetector>>,
}

impl EitherOf {
    pub fn new(detectors: Vec<Box<dyn NextPageDetector>>) -> Self {
        Self { detectors }
    }
}

impl NextPageDetector for EitherOf {
    fn has_next_page(&self, document: &Html) -> bool {
        self.detectors.iter().any(|d| d.has_next_page(document))
    }
}

/// Builds the detector selected by config
pub fn detector_for(strategy: PaginationStrategy) -> Box<dyn NextPageDetector> {
    match strategy {
        PaginationStrategy::NextLinkText => Box::new(NextLinkText::new()),
        PaginationStrategy::RelNext => Box::new(RelNext::new()),
        PaginationStrategy::Any => Box::new(EitherOf::new(vec![
            Box::new(NextLinkText::new()),
            Box::new(RelNext::new()),
        ])),
    }
}
