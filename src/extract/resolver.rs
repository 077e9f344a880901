//! Generic resolvers that evaluate one rule against a parsed document
//!
//! Resolvers are total: a missing element is [`FieldValue::Absent`], never an
//! error.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text is never treated as a label
const IGNORED_PARENTS: &[&str] = &["script", "style", "noscript", "title"];

/// The outcome of resolving one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Non-empty, trimmed text
    Found(String),
    /// Nothing usable on this page
    Absent,
}

impl FieldValue {
    /// Wraps trimmed text, treating empty text as absent
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::Absent
        } else {
            Self::Found(trimmed.to_string())
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The stored form: the text, or an empty string when absent
    pub fn into_string(self) -> String {
        match self {
            Self::Found(text) => text,
            Self::Absent => String::new(),
        }
    }
}

/// Concatenated text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Resolves a labeled field
///
/// Walks text nodes in document order and takes the first one that matches
/// `label` and whose parent element has a following sibling element. The
/// value is that sibling's text.
pub fn resolve_label(document: &Html, label: &Regex) -> FieldValue {
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        if !label.is_match(text) {
            continue;
        }

        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        if IGNORED_PARENTS.contains(&parent.value().name()) {
            continue;
        }

        if let Some(sibling) = parent.next_siblings().find_map(ElementRef::wrap) {
            return FieldValue::from_text(&element_text(sibling));
        }
    }

    FieldValue::Absent
}

/// Resolves a structural field from a prioritized selector chain
pub fn resolve_selectors(document: &Html, chain: &[Selector]) -> FieldValue {
    chain
        .iter()
        .flat_map(|selector| document.select(selector))
        .map(|element| FieldValue::from_text(&element_text(element)))
        .find(FieldValue::is_found)
        .unwrap_or(FieldValue::Absent)
}

/// Maps a raw franchise value onto `"Yes"` / `"No"`
pub fn normalize_yes_no(value: FieldValue) -> String {
    match value {
        FieldValue::Found(text) if text.to_lowercase().contains("yes") => "Yes".to_string(),
        _ => "No".to_string(),
    }
}

/// Builds the case-insensitive regex that matches any of `labels`
pub fn label_regex(labels: &[&str]) -> Result<Regex, regex::Error> {
    let alternatives = labels
        .iter()
        .map(|label| regex::escape(label))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{})", alternatives))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors(list: &[&str]) -> Vec<Selector> {
        list.iter().map(|s| Selector::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_label_reads_next_sibling() {
        let doc = Html::parse_document(
            "<dl><dt>Gross Revenue:</dt><dd> $1,200,000 </dd></dl>",
        );
        let label = label_regex(&["Revenue", "Gross Sales"]).unwrap();
        assert_eq!(
            resolve_label(&doc, &label),
            FieldValue::Found("$1,200,000".to_string())
        );
    }

    #[test]
    fn test_label_is_case_insensitive() {
        let doc = Html::parse_document("<p><b>CASH FLOW</b><span>$310,000</span></p>");
        let label = label_regex(&["EBITDA", "Cash Flow"]).unwrap();
        assert_eq!(
            resolve_label(&doc, &label),
            FieldValue::Found("$310,000".to_string())
        );
    }

    #[test]
    fn test_label_skips_matches_without_sibling() {
        let doc = Html::parse_document(
            r#"<nav><a href="/franchise">Franchise Opportunities</a></nav>
               <dl><dt>Franchise</dt><dd>Yes</dd></dl>"#,
        );
        let label = label_regex(&["Franchise"]).unwrap();
        assert_eq!(
            resolve_label(&doc, &label),
            FieldValue::Found("Yes".to_string())
        );
    }

    #[test]
    fn test_label_ignores_script_text() {
        let doc = Html::parse_document(
            r#"<script>var Employees = 3;</script><div>after</div>"#,
        );
        let label = label_regex(&["Employees"]).unwrap();
        assert_eq!(resolve_label(&doc, &label), FieldValue::Absent);
    }

    #[test]
    fn test_label_absent() {
        let doc = Html::parse_document("<p>No financials disclosed</p>");
        let label = label_regex(&["Revenue"]).unwrap();
        assert_eq!(resolve_label(&doc, &label), FieldValue::Absent);
    }

    #[test]
    fn test_label_with_empty_sibling_is_absent() {
        let doc = Html::parse_document("<dl><dt>Employees</dt><dd>   </dd></dl>");
        let label = label_regex(&["Employees"]).unwrap();
        assert_eq!(resolve_label(&doc, &label), FieldValue::Absent);
    }

    #[test]
    fn test_label_regex_escapes_metacharacters() {
        let label = label_regex(&["Sales (Gross)"]).unwrap();
        assert!(label.is_match("sales (gross)"));
        assert!(!label.is_match("Sales Gross"));
    }

    #[test]
    fn test_selector_chain_priority() {
        let doc = Html::parse_document(
            r#"<div class="price">$99</div><span class="price">$450,000</span>"#,
        );
        let chain = selectors(&["span.price", "div.price"]);
        assert_eq!(
            resolve_selectors(&doc, &chain),
            FieldValue::Found("$450,000".to_string())
        );
    }

    #[test]
    fn test_selector_chain_falls_back() {
        let doc = Html::parse_document(r#"<div class="price"> $99 </div>"#);
        let chain = selectors(&["span.price", "div.price"]);
        assert_eq!(
            resolve_selectors(&doc, &chain),
            FieldValue::Found("$99".to_string())
        );
    }

    #[test]
    fn test_selector_chain_skips_empty_matches() {
        let doc = Html::parse_document(
            "<html><head><title>Bakery for Sale</title></head><body><h1> </h1></body></html>",
        );
        let chain = selectors(&["h1", "title"]);
        assert_eq!(
            resolve_selectors(&doc, &chain),
            FieldValue::Found("Bakery for Sale".to_string())
        );
    }

    #[test]
    fn test_normalize_yes_no() {
        assert_eq!(
            normalize_yes_no(FieldValue::Found("Yes - this is a franchise".to_string())),
            "Yes"
        );
        assert_eq!(normalize_yes_no(FieldValue::Found("YES".to_string())), "Yes");
        assert_eq!(
            normalize_yes_no(FieldValue::Found("Independent".to_string())),
            "No"
        );
        assert_eq!(normalize_yes_no(FieldValue::Absent), "No");
    }
}
