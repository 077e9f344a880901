//! Storage module for publishing harvested listings
//!
//! This module handles all database operations for the publisher, including:
//! - SQLite database initialization and schema management
//! - Full-replace publishing of the listing set
//! - Run history (when, which config, how many records)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqlitePublisher;
pub use traits::{Publisher, StorageError, StorageResult};

use crate::crawler::CrawlReport;
use chrono::SecondsFormat;

/// Metadata stored with every publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub started_at: String,
    pub finished_at: String,
    pub config_hash: String,
    pub status: RunStatus,
}

impl RunMetadata {
    /// Describes the run that produced `report`
    pub fn from_report(report: &CrawlReport, config_hash: &str) -> Self {
        Self {
            started_at: report.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            finished_at: report.finished_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            config_hash: config_hash.to_string(),
            status: if report.cancelled {
                RunStatus::Cancelled
            } else {
                RunStatus::Completed
            },
        }
    }
}

/// A publish as recorded in the `runs` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub published_at: String,
    pub started_at: String,
    pub finished_at: String,
    pub config_hash: String,
    pub record_count: i64,
    pub status: RunStatus,
}

/// How the published run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}
