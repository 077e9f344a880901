//! SQLite publisher implementation
//!
//! This module provides a SQLite-based implementation of the Publisher trait.

use crate::record::Record;
use crate::storage::schema::{initialize_schema, insert_listing_sql, select_listings_sql};
use crate::storage::traits::{Publisher, StorageError, StorageResult};
use crate::storage::{RunMetadata, RunRecord, RunStatus};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;

/// SQLite publish destination
pub struct SqlitePublisher {
    conn: Connection,
}

impl SqlitePublisher {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqlitePublisher)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Reads the current listing set in published order
    pub fn load_listings(&self) -> StorageResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(&select_listings_sql())?;

        let records = stmt
            .query_map([], |row| {
                Ok(Record {
                    listing_id: row.get(0)?,
                    partition: row.get(1)?,
                    business_name: row.get(2)?,
                    business_type: row.get(3)?,
                    price: row.get(4)?,
                    revenue: row.get(5)?,
                    ebitda: row.get(6)?,
                    franchise: row.get(7)?,
                    established_year: row.get(8)?,
                    location: row.get(9)?,
                    employees: row.get(10)?,
                    description: row.get(11)?,
                    facilities: row.get(12)?,
                    reason_for_selling: row.get(13)?,
                    url: row.get(14)?,
                    scrape_timestamp: row.get(15)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count_listings(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// The most recent publish, if any
    pub fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, published_at, started_at, finished_at, config_hash, record_count, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, published_at, started_at, finished_at, config_hash, record_count, status)) =
            row
        else {
            return Ok(None);
        };

        let status = RunStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Database(format!("unknown run status '{}'", status)))?;

        Ok(Some(RunRecord {
            id,
            published_at,
            started_at,
            finished_at,
            config_hash,
            record_count,
            status,
        }))
    }
}

impl Publisher for SqlitePublisher {
    fn publish(&mut self, records: &[Record], run: &RunMetadata) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM listings", [])?;

        {
            let mut stmt = tx.prepare(&insert_listing_sql())?;
            for record in records {
                stmt.execute(params_from_iter(record.values()))?;
            }
        }

        let published_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        tx.execute(
            "INSERT INTO runs (published_at, started_at, finished_at, config_hash, record_count, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                published_at,
                run.started_at,
                run.finished_at,
                run.config_hash,
                records.len() as i64,
                run.status.to_db_string()
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        tx.commit()?;

        tracing::info!(records = records.len(), run_id, "Published listings");
        Ok(run_id)
    }
}
