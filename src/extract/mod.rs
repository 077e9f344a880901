//! Field extraction from listing detail pages
//!
//! [`FieldExtractor`] evaluates the rule table in [`rules`] against a parsed
//! document. Extraction is total: every field resolves to a value or to an
//! empty string, and the same document, URL and context always produce the
//! same [`Record`].

mod resolver;
mod rules;

pub use resolver::{
    element_text, label_regex, normalize_yes_no, resolve_label, resolve_selectors, FieldValue,
};
pub use rules::{Field, FieldRule, Normalizer, Strategy, DEFAULT_RULES};

use crate::record::Record;
use crate::url::listing_id_from_url;
use crate::ConfigError;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Inputs to extraction that do not come from the document itself
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    /// Display name of the partition, stored verbatim on the record
    pub partition: String,
    /// Time the detail page was scraped
    pub scraped_at: DateTime<Utc>,
}

impl ExtractionContext {
    pub fn new(partition: impl Into<String>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            partition: partition.into(),
            scraped_at,
        }
    }

    /// Context stamped with the current time
    pub fn now(partition: impl Into<String>) -> Self {
        Self::new(partition, Utc::now())
    }

    fn timestamp(&self) -> String {
        self.scraped_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// A rule with its patterns compiled
#[derive(Debug, Clone)]
enum CompiledStrategy {
    Label(Regex),
    Selectors(Vec<Selector>),
}

#[derive(Debug, Clone)]
struct CompiledRule {
    field: Field,
    strategy: CompiledStrategy,
    normalizer: Normalizer,
}

impl CompiledRule {
    fn compile(rule: &FieldRule) -> Result<Self, ConfigError> {
        let strategy = match rule.strategy {
            Strategy::Label(labels) => CompiledStrategy::Label(label_regex(labels).map_err(|e| {
                ConfigError::InvalidPattern(format!("{}: {}", rule.field.name(), e))
            })?),
            Strategy::Selectors(selectors) => CompiledStrategy::Selectors(
                selectors
                    .iter()
                    .map(|s| {
                        Selector::parse(s).map_err(|e| {
                            ConfigError::InvalidPattern(format!(
                                "{} selector '{}': {}",
                                rule.field.name(),
                                s,
                                e
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        Ok(Self {
            field: rule.field,
            strategy,
            normalizer: rule.normalizer,
        })
    }

    fn evaluate(&self, document: &Html) -> String {
        let value = match &self.strategy {
            CompiledStrategy::Label(label) => resolve_label(document, label),
            CompiledStrategy::Selectors(chain) => resolve_selectors(document, chain),
        };

        match self.normalizer {
            Normalizer::Text => value.into_string(),
            Normalizer::YesNo => normalize_yes_no(value),
        }
    }
}

/// Extracts [`Record`]s from listing detail pages
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    rules: Vec<CompiledRule>,
}

impl FieldExtractor {
    /// Creates an extractor for the built-in rule table
    pub fn new() -> Self {
        // The built-in table is covered by tests, so a rule that fails to
        // compile is dropped with a warning instead of failing the run.
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|rule| match CompiledRule::compile(rule) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    tracing::warn!("Skipping extraction rule: {}", e);
                    None
                }
            })
            .collect();

        Self { rules }
    }

    /// Creates an extractor for a custom rule table
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if a selector or label does
    /// not compile.
    pub fn with_rules(rules: &[FieldRule]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Extracts a record from a parsed detail page
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed detail page
    /// * `source_url` - Canonical URL the page was fetched from
    /// * `context` - Partition and scrape time stamped onto the record
    ///
    /// # Returns
    ///
    /// A record with every column present; fields that could not be found
    /// are empty strings and `franchise` is `"Yes"` or `"No"`.
    pub fn extract(
        &self,
        document: &Html,
        source_url: &Url,
        context: &ExtractionContext,
    ) -> Record {
        let mut record = Record {
            listing_id: listing_id_from_url(source_url),
            partition: context.partition.clone(),
            franchise: normalize_yes_no(FieldValue::Absent),
            url: source_url.to_string(),
            scrape_timestamp: context.timestamp(),
            ..Record::default()
        };

        for rule in &self.rules {
            rule.field.assign(&mut record, rule.evaluate(document));
        }

        tracing::debug!(
            url = %source_url,
            listing_id = %record.listing_id,
            hollow = record.is_hollow(),
            "Extracted listing"
        );

        record
    }

    /// Parses `body` and extracts a record from it
    pub fn extract_html(
        &self,
        body: &str,
        source_url: &Url,
        context: &ExtractionContext,
    ) -> Record {
        let document = Html::parse_document(body);
        self.extract(&document, source_url, context)
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}
