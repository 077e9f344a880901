//! Output module for run snapshots and summaries
//!
//! This module handles:
//! - Writing the local JSON backup of a run's records
//! - Printing run statistics to stdout
//! - Generating a markdown summary of a run

mod json_backup;
mod markdown;
pub mod stats;
mod traits;

pub use json_backup::JsonBackup;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_summary, RunStatistics};
pub use traits::{BackupWriter, OutputError, OutputResult};
