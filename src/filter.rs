//! Optional record filtering
//!
//! Filters are applied to each record after extraction. Money fields on the
//! site are free text (`"$1,250,000"`, `"Not Disclosed"`), so a value that
//! cannot be read as a number never causes a record to be dropped.

use crate::config::FilterConfig;
use crate::record::Record;

/// Parses a money string leniently
///
/// Currency symbols, thousands separators and surrounding words are ignored.
/// Returns None when the string contains no digits.
///
/// # Examples
///
/// ```
/// use listing_harvester::filter::parse_money;
///
/// assert_eq!(parse_money("$1,250,000"), Some(1_250_000.0));
/// assert_eq!(parse_money("Asking: $99.50"), Some(99.5));
/// assert_eq!(parse_money("Not Disclosed"), None);
/// ```
pub fn parse_money(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;

    let number: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();

    number.trim_end_matches('.').parse().ok()
}

/// Keeps or drops records according to the `[filters]` config section
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    min_price: Option<f64>,
    max_price: Option<f64>,
    min_revenue: Option<f64>,
    franchise_only: bool,
}

impl RecordFilter {
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            min_price: config.min_price,
            max_price: config.max_price,
            min_revenue: config.min_revenue,
            franchise_only: config.franchise_only,
        }
    }

    /// Returns true if no filter is configured
    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_revenue.is_none()
            && !self.franchise_only
    }

    /// Returns true if the record should be kept
    pub fn accepts(&self, record: &Record) -> bool {
        if self.franchise_only && record.franchise != "Yes" {
            return false;
        }

        if let Some(price) = parse_money(&record.price) {
            if self.min_price.is_some_and(|min| price < min) {
                return false;
            }
            if self.max_price.is_some_and(|max| price > max) {
                return false;
            }
        }

        if let (Some(min), Some(revenue)) = (self.min_revenue, parse_money(&record.revenue)) {
            if revenue < min {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(price: &str, revenue: &str, franchise: &str) -> Record {
        Record {
            price: price.to_string(),
            revenue: revenue.to_string(),
            franchise: franchise.to_string(),
            url: "https://example.com/listing/1".to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("$450,000"), Some(450_000.0));
        assert_eq!(parse_money("  1200 "), Some(1200.0));
        assert_eq!(parse_money("$1,200,000."), Some(1_200_000.0));
        assert_eq!(parse_money(""), None);
        assert_eq!(parse_money("Call for price"), None);
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = RecordFilter::default();
        assert!(filter.is_empty());
        assert!(filter.accepts(&record("", "", "No")));
        assert!(filter.accepts(&record("$1", "$1", "No")));
    }

    #[test]
    fn test_price_bounds() {
        let filter = RecordFilter::from_config(&FilterConfig {
            min_price: Some(50_000.0),
            max_price: Some(500_000.0),
            ..FilterConfig::default()
        });

        assert!(!filter.is_empty());
        assert!(!filter.accepts(&record("$49,999", "", "No")));
        assert!(filter.accepts(&record("$50,000", "", "No")));
        assert!(filter.accepts(&record("$500,000", "", "No")));
        assert!(!filter.accepts(&record("$650,000", "", "No")));
    }

    #[test]
    fn test_unparseable_values_are_kept() {
        let filter = RecordFilter::from_config(&FilterConfig {
            min_price: Some(50_000.0),
            min_revenue: Some(100_000.0),
            ..FilterConfig::default()
        });

        assert!(filter.accepts(&record("Not Disclosed", "", "No")));
        assert!(filter.accepts(&record("", "N/A", "No")));
    }

    #[test]
    fn test_min_revenue() {
        let filter = RecordFilter::from_config(&FilterConfig {
            min_revenue: Some(100_000.0),
            ..FilterConfig::default()
        });

        assert!(!filter.accepts(&record("", "$80,000", "No")));
        assert!(filter.accepts(&record("", "$1,200,000", "No")));
    }

    #[test]
    fn test_franchise_only() {
        let filter = RecordFilter::from_config(&FilterConfig {
            franchise_only: true,
            ..FilterConfig::default()
        });

        assert!(filter.accepts(&record("", "", "Yes")));
        assert!(!filter.accepts(&record("", "", "No")));
    }
}
