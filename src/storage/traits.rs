//! Publisher trait and error types
//!
//! This module defines the interface for publishing a run's records to the
//! remote destination, and the associated error type.

use crate::record::Record;
use crate::storage::RunMetadata;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Publishes a run's records to the destination
///
/// A publish replaces the destination's listing set: after two publishes
/// only the second set remains. Implementations must either apply a publish
/// completely or not at all.
pub trait Publisher {
    /// Replaces the destination's listings with `records`
    ///
    /// # Arguments
    ///
    /// * `records` - All records of the run, in crawl order
    /// * `run` - Metadata recorded alongside the publish
    ///
    /// # Returns
    ///
    /// The ID of the recorded run
    fn publish(&mut self, records: &[Record], run: &RunMetadata) -> StorageResult<i64>;
}
