//! Search-results page parser
//!
//! This module handles parsing a search-results page to extract:
//! - Detail links (anchors whose path matches the detail pattern)
//! - Whether a following results page exists
//!
//! Parsing is synchronous and the parsed document never outlives the call,
//! so callers can freely await between pages.

use crate::crawler::pagination::NextPageDetector;
use crate::url::{canonicalize_url, resolve_link};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// What the crawler needs from one search-results page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Canonical detail URLs in document order, deduplicated
    pub detail_links: Vec<Url>,

    /// Whether the page advertises a following page
    pub has_next_page: bool,
}

/// Parses a search-results page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` whose resolved path matches `detail_pattern`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Links that fail to canonicalize
/// - Repeats of a link already seen on this page
///
/// # Arguments
///
/// * `html` - The page body
/// * `page_url` - The URL the page was served from, for resolving relative links
/// * `detail_pattern` - Regex matched against each resolved link's path
/// * `detector` - Pagination strategy
///
/// # Example
///
/// ```
/// use listing_harvester::crawler::{parse_search_page, NextLinkText};
/// use regex::Regex;
/// use url::Url;
///
/// let html = r#"<a href="/listing/42/">Bakery</a><a href="?page=2">Next</a>"#;
/// let page_url = Url::parse("https://example.com/businesses-for-sale/").unwrap();
/// let pattern = Regex::new("/listing/").unwrap();
///
/// let page = parse_search_page(html, &page_url, &pattern, &NextLinkText::new());
/// assert_eq!(page.detail_links[0].as_str(), "https://example.com/listing/42/");
/// assert!(page.has_next_page);
/// ```
pub fn parse_search_page(
    html: &str,
    page_url: &Url,
    detail_pattern: &Regex,
    detector: &dyn NextPageDetector,
) -> SearchPage {
    let document = Html::parse_document(html);

    SearchPage {
        detail_links: extract_detail_links(&document, page_url, detail_pattern),
        has_next_page: detector.has_next_page(&document),
    }
}

/// Extracts canonical detail links from a parsed page
pub fn extract_detail_links(document: &Html, page_url: &Url, detail_pattern: &Regex) -> Vec<Url> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(absolute) = resolve_link(href, page_url) else {
            continue;
        };

        if !detail_pattern.is_match(absolute.path()) {
            continue;
        }

        match canonicalize_url(absolute.as_str()) {
            Ok(canonical) => {
                if seen.insert(canonical.as_str().to_string()) {
                    links.push(canonical);
                }
            }
            Err(e) => {
                tracing::debug!(href, "Skipping uncanonicalizable link: {}", e);
            }
        }
    }

    links
}
