//! URL handling module for Listing Harvester
//!
//! This module provides URL canonicalization, search URL construction,
//! link resolution and the partition naming helpers used across the crawler.

mod normalize;
mod search;

use url::Url;

// Re-export main functions
pub use normalize::canonicalize_url;
pub use search::SearchUrlBuilder;

/// Path component that introduces a listing's numeric identifier
const LISTING_SEGMENT: &str = "/listing/";

/// Extracts the numeric listing id that follows a `/listing/` path component
///
/// Returns an empty string when the URL carries no such id.
///
/// # Examples
///
/// ```
/// use listing_harvester::url::listing_id_from_url;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/listing/2154879/").unwrap();
/// assert_eq!(listing_id_from_url(&url), "2154879");
/// ```
pub fn listing_id_from_url(url: &Url) -> String {
    let path = url.path();

    path.match_indices(LISTING_SEGMENT)
        .map(|(idx, _)| {
            path[idx + LISTING_SEGMENT.len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .find(|digits| !digits.is_empty())
        .unwrap_or_default()
}

/// Turns a partition key into the slug used inside search URLs
///
/// `"New Hanover"` becomes `"new-hanover"`.
pub fn partition_slug(key: &str) -> String {
    key.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Turns a partition key into the title-cased name stored on records
///
/// `"iredell"` becomes `"Iredell"`, `"new hanover"` becomes `"New Hanover"`
/// and `"winston-salem"` becomes `"Winston-Salem"`.
pub fn partition_display_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    let mut at_word_start = true;

    for c in key.trim().chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                name.extend(c.to_uppercase());
            } else {
                name.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            name.push(c);
            at_word_start = true;
        }
    }

    name
}

/// Resolves a link href against the page it appeared on
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url)
        }
        _ => None,
    }
}
