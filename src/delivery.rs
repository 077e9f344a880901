//! Hands a finished run's records to the sinks
//!
//! The backup and the publish run independently: a failing backup does not
//! stop the publish, and neither failure loses the in-memory records.

use crate::output::BackupWriter;
use crate::record::Record;
use crate::storage::{Publisher, RunMetadata};
use crate::HarvestError;

/// What happened to one sink
#[derive(Debug)]
pub enum SinkStatus {
    /// Disabled, or there was nothing to write
    Skipped,
    Written,
    Failed(HarvestError),
}

impl SinkStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-sink results of a delivery
#[derive(Debug)]
pub struct DeliveryReport {
    pub backup: SinkStatus,
    pub publish: SinkStatus,
}

impl DeliveryReport {
    /// Names and errors of the sinks that failed
    pub fn failures(&self) -> Vec<(&'static str, &HarvestError)> {
        [("backup", &self.backup), ("publish", &self.publish)]
            .into_iter()
            .filter_map(|(name, status)| match status {
                SinkStatus::Failed(e) => Some((name, e)),
                _ => None,
            })
            .collect()
    }

    pub fn is_ok(&self) -> bool {
        !self.backup.is_failed() && !self.publish.is_failed()
    }
}

/// Writes the backup and publishes `records`
///
/// A `None` sink is skipped. An empty record set is never written out, so a
/// blocked crawl cannot replace the previously published listings.
///
/// # Arguments
///
/// * `records` - All records of the run, in crawl order
/// * `backup` - The local backup writer, if enabled
/// * `publisher` - The publish destination, if enabled
/// * `run` - Metadata recorded alongside the publish
pub fn deliver(
    records: &[Record],
    backup: Option<&dyn BackupWriter>,
    publisher: Option<&mut dyn Publisher>,
    run: &RunMetadata,
) -> DeliveryReport {
    if records.is_empty() {
        tracing::warn!("No records collected; skipping backup and publish");
        return DeliveryReport {
            backup: SinkStatus::Skipped,
            publish: SinkStatus::Skipped,
        };
    }

    let backup = match backup {
        None => SinkStatus::Skipped,
        Some(writer) => match writer.write_backup(records) {
            Ok(()) => SinkStatus::Written,
            Err(e) => {
                tracing::error!("Backup failed: {}", e);
                SinkStatus::Failed(e.into())
            }
        },
    };

    let publish = match publisher {
        None => SinkStatus::Skipped,
        Some(publisher) => match publisher.publish(records, run) {
            Ok(run_id) => {
                tracing::debug!(run_id, "Publish recorded");
                SinkStatus::Written
            }
            Err(e) => {
                tracing::error!("Publish failed: {}", e);
                SinkStatus::Failed(e.into())
            }
        },
    };

    DeliveryReport { backup, publish }
}
