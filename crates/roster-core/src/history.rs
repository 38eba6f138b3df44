//! Log of completed synchronizations

use crate::error::{Error, Result};
use crate::reconcile::ReconcileReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One completed sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the new generation was committed
    pub timestamp: DateTime<Utc>,
    pub report: ReconcileReport,
}

/// Sync history, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncHistory {
    pub entries: Vec<HistoryEntry>,
}

impl SyncHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load history from a file, or create empty if not exists
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn record(&mut self, timestamp: DateTime<Utc>, report: ReconcileReport) {
        self.entries.push(HistoryEntry { timestamp, report });
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Entries newest first, at most `limit` of them
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev().take(limit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn report(created: usize) -> ReconcileReport {
        ReconcileReport {
            created,
            ..Default::default()
        }
    }

    #[test]
    fn test_history_record_and_recent() {
        let mut history = SyncHistory::new();
        for day in 1..=3 {
            history.record(
                Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
                report(day as usize),
            );
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.last().unwrap().report.created, 3);

        let recent: Vec<usize> = history.recent(2).map(|e| e.report.created).collect();
        assert_eq!(recent, vec![3, 2]);
    }

    #[test]
    fn test_history_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        assert!(SyncHistory::load(&path).unwrap().is_empty());

        let mut history = SyncHistory::new();
        let mut promoted = report(1);
        promoted.promoted.push(("local-hero-1".into(), "Тал".into()));
        history.record(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(), promoted);
        history.save(&path).unwrap();

        assert_eq!(SyncHistory::load(&path).unwrap(), history);
    }
}
