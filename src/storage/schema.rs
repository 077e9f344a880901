//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the publish database.

use crate::record::COLUMNS;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Current listing set; replaced wholesale on every publish
CREATE TABLE IF NOT EXISTS listings (
    listing_id TEXT NOT NULL,
    partition TEXT NOT NULL,
    business_name TEXT NOT NULL,
    business_type TEXT NOT NULL,
    price TEXT NOT NULL,
    revenue TEXT NOT NULL,
    ebitda TEXT NOT NULL,
    franchise TEXT NOT NULL,
    established_year TEXT NOT NULL,
    location TEXT NOT NULL,
    employees TEXT NOT NULL,
    description TEXT NOT NULL,
    facilities TEXT NOT NULL,
    reason_for_selling TEXT NOT NULL,
    url TEXT NOT NULL,
    scrape_timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_partition ON listings(partition);

-- One row per publish
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    published_at TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    record_count INTEGER NOT NULL,
    status TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// The INSERT statement for one listing row, columns in record order
pub fn insert_listing_sql() -> String {
    let placeholders = (1..=COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO listings ({}) VALUES ({})",
        COLUMNS.join(", "),
        placeholders
    )
}

/// The SELECT statement that reads listings back in insertion order
pub fn select_listings_sql() -> String {
    format!("SELECT {} FROM listings ORDER BY rowid", COLUMNS.join(", "))
}
