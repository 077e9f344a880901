//! The extraction rule table
//!
//! Each extracted field is described by one [`FieldRule`]: which record field
//! it fills, how the value is located, and how the raw text is normalized.
//! The heuristics live here as data so that each one can be read and tested in
//! isolation.

use crate::record::Record;

/// Record fields filled from the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BusinessName,
    BusinessType,
    Price,
    Revenue,
    Ebitda,
    Franchise,
    EstablishedYear,
    Location,
    Employees,
    Description,
    Facilities,
    ReasonForSelling,
}

impl Field {
    /// Column name of this field
    pub fn name(&self) -> &'static str {
        match self {
            Self::BusinessName => "business_name",
            Self::BusinessType => "business_type",
            Self::Price => "price",
            Self::Revenue => "revenue",
            Self::Ebitda => "ebitda",
            Self::Franchise => "franchise",
            Self::EstablishedYear => "established_year",
            Self::Location => "location",
            Self::Employees => "employees",
            Self::Description => "description",
            Self::Facilities => "facilities",
            Self::ReasonForSelling => "reason_for_selling",
        }
    }

    /// Writes `value` into the matching record field
    pub fn assign(&self, record: &mut Record, value: String) {
        let slot = match self {
            Self::BusinessName => &mut record.business_name,
            Self::BusinessType => &mut record.business_type,
            Self::Price => &mut record.price,
            Self::Revenue => &mut record.revenue,
            Self::Ebitda => &mut record.ebitda,
            Self::Franchise => &mut record.franchise,
            Self::EstablishedYear => &mut record.established_year,
            Self::Location => &mut record.location,
            Self::Employees => &mut record.employees,
            Self::Description => &mut record.description,
            Self::Facilities => &mut record.facilities,
            Self::ReasonForSelling => &mut record.reason_for_selling,
        };
        *slot = value;
    }
}

/// How a field's value is located in the document
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// Find a text node containing any of the labels (case-insensitive) and
    /// read the next sibling element of the node's parent
    Label(&'static [&'static str]),

    /// Try each CSS selector in order; the first non-empty match wins
    Selectors(&'static [&'static str]),
}

/// How raw text is turned into the stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// Trimmed text, empty when absent
    Text,

    /// `"Yes"` if the text contains "yes" (any case), otherwise `"No"`.
    /// An absent label also maps to `"No"`, so "unknown" and "not a
    /// franchise" cannot be told apart.
    YesNo,
}

/// One row of the rule table
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub strategy: Strategy,
    pub normalizer: Normalizer,
}

impl FieldRule {
    const fn label(field: Field, labels: &'static [&'static str]) -> Self {
        Self {
            field,
            strategy: Strategy::Label(labels),
            normalizer: Normalizer::Text,
        }
    }

    const fn selectors(field: Field, selectors: &'static [&'static str]) -> Self {
        Self {
            field,
            strategy: Strategy::Selectors(selectors),
            normalizer: Normalizer::Text,
        }
    }
}

/// Rules for the listing detail pages of the target site
pub const DEFAULT_RULES: &[FieldRule] = &[
    FieldRule::selectors(Field::BusinessName, &["h1", "title"]),
    FieldRule::selectors(Field::BusinessType, &["div.category", "span.category"]),
    FieldRule::selectors(Field::Price, &["span.price", "div.price"]),
    FieldRule::label(Field::Revenue, &["Revenue", "Gross Sales"]),
    FieldRule::label(Field::Ebitda, &["EBITDA", "Cash Flow", "Net Income"]),
    FieldRule {
        field: Field::Franchise,
        strategy: Strategy::Label(&["Franchise"]),
        normalizer: Normalizer::YesNo,
    },
    FieldRule::label(Field::EstablishedYear, &["Established", "Year Established"]),
    FieldRule::selectors(Field::Location, &["span.location", "div.location"]),
    FieldRule::label(Field::Employees, &["Employees"]),
    FieldRule::selectors(Field::Description, &["div.description", "div#description"]),
    FieldRule::label(Field::Facilities, &["Facilities", "Real Estate"]),
    FieldRule::label(Field::ReasonForSelling, &["Reason for Selling"]),
];
