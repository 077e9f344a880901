//! Sink traits and error types
//!
//! This module defines the interface for the local backup writer and the
//! associated error type. The publisher interface lives in `storage`.

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize records: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes a durable local snapshot of a run's records
///
/// Each call replaces the previous snapshot, so writing the same records
/// twice leaves the same file.
pub trait BackupWriter {
    /// Writes `records` in column order
    ///
    /// # Arguments
    ///
    /// * `records` - All records of the run, in crawl order
    fn write_backup(&self, records: &[Record]) -> OutputResult<()>;
}
