//! JSON backup snapshot
//!
//! The snapshot is a JSON array of records with every column present. It is
//! written to a sibling temporary file and renamed into place, so a crash
//! mid-write never leaves a truncated backup.

use crate::output::traits::{BackupWriter, OutputError, OutputResult};
use crate::record::Record;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the backup snapshot as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonBackup {
    path: PathBuf,
}

impl JsonBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a snapshot back
    pub fn load(&self) -> OutputResult<Vec<Record>> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn temp_path(&self) -> OutputResult<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| OutputError::Write(format!("invalid backup path {:?}", self.path)))?;

        let mut temp_name = file_name.to_os_string();
        temp_name.push(".tmp");
        Ok(self.path.with_file_name(temp_name))
    }
}

impl BackupWriter for JsonBackup {
    fn write_backup(&self, records: &[Record]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(records)?;
        let temp = self.temp_path()?;
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;

        tracing::info!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str) -> Record {
        Record {
            listing_id: id.to_string(),
            partition: "Iredell".to_string(),
            franchise: "No".to_string(),
            url: format!("https://www.bizbuysell.com/listing/{}/", id),
            scrape_timestamp: "2026-10-19T12:00:00Z".to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn test_write_and_load() {
        let dir = TempDir::new().unwrap();
        let backup = JsonBackup::new(dir.path().join("listings.json"));

        backup.write_backup(&[record("1"), record("2")]).unwrap();
        let loaded = backup.load().unwrap();

        assert_eq!(loaded, vec![record("1"), record("2")]);
        assert!(!dir.path().join("listings.json.tmp").exists());
    }

    #[test]
    fn test_every_column_written() {
        let dir = TempDir::new().unwrap();
        let backup = JsonBackup::new(dir.path().join("listings.json"));
        backup.write_backup(&[record("1")]).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(backup.path()).unwrap()).unwrap();
        let object = json[0].as_object().unwrap();
        for column in crate::record::COLUMNS {
            assert!(object.contains_key(column), "{} missing", column);
        }
    }

    #[test]
    fn test_overwrite_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let backup = JsonBackup::new(dir.path().join("listings.json"));

        backup.write_backup(&[record("1"), record("2"), record("3")]).unwrap();
        backup.write_backup(&[record("4")]).unwrap();
        let first = fs::read_to_string(backup.path()).unwrap();

        backup.write_backup(&[record("4")]).unwrap();
        let second = fs::read_to_string(backup.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(backup.load().unwrap(), vec![record("4")]);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let backup = JsonBackup::new(dir.path().join("nested/out/listings.json"));
        backup.write_backup(&[]).unwrap();
        assert!(backup.load().unwrap().is_empty());
    }
}
