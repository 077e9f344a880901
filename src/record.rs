//! The fixed-schema listing record
//!
//! Every record carries all sixteen columns as strings. A field that could not
//! be extracted is an empty string, never missing, so sinks can rely on a fixed
//! column set.

use serde::{Deserialize, Serialize};

/// Column names in the order every sink writes them
pub const COLUMNS: [&str; 16] = [
    "listing_id",
    "partition",
    "business_name",
    "business_type",
    "price",
    "revenue",
    "ebitda",
    "franchise",
    "established_year",
    "location",
    "employees",
    "description",
    "facilities",
    "reason_for_selling",
    "url",
    "scrape_timestamp",
];

/// One business listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub listing_id: String,
    pub partition: String,
    pub business_name: String,
    pub business_type: String,
    pub price: String,
    pub revenue: String,
    pub ebitda: String,
    /// Always `"Yes"` or `"No"`
    pub franchise: String,
    pub established_year: String,
    pub location: String,
    pub employees: String,
    pub description: String,
    pub facilities: String,
    pub reason_for_selling: String,
    /// Canonical absolute URL of the detail page; never empty
    pub url: String,
    /// ISO-8601 UTC time of extraction
    pub scrape_timestamp: String,
}

impl Record {
    /// Returns the field values in [`COLUMNS`] order
    pub fn values(&self) -> [&str; 16] {
        [
            self.listing_id.as_str(),
            self.partition.as_str(),
            self.business_name.as_str(),
            self.business_type.as_str(),
            self.price.as_str(),
            self.revenue.as_str(),
            self.ebitda.as_str(),
            self.franchise.as_str(),
            self.established_year.as_str(),
            self.location.as_str(),
            self.employees.as_str(),
            self.description.as_str(),
            self.facilities.as_str(),
            self.reason_for_selling.as_str(),
            self.url.as_str(),
            self.scrape_timestamp.as_str(),
        ]
    }

    /// Returns true if every extracted (non-context) field came back empty
    pub fn is_hollow(&self) -> bool {
        [
            &self.business_name,
            &self.business_type,
            &self.price,
            &self.revenue,
            &self.ebitda,
            &self.established_year,
            &self.location,
            &self.employees,
            &self.description,
            &self.facilities,
            &self.reason_for_selling,
        ]
        .iter()
        .all(|v| v.is_empty())
    }
}
