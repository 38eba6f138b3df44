//! Snapshots of the roster and translation cache
//!
//! Backups are pretty JSON files named after their creation time, so a
//! backup directory can be listed without opening every file.

use crate::error::{Error, Result};
use crate::record::HeroRecord;
use crate::translate::TranslationCache;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_EXTENSION: &str = "json";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Everything needed to restore a roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    pub created_at: DateTime<Utc>,
    pub records: Vec<HeroRecord>,
    #[serde(default)]
    pub translations: TranslationCache,
}

impl BackupFile {
    pub fn new(
        created_at: DateTime<Utc>,
        records: Vec<HeroRecord>,
        translations: TranslationCache,
    ) -> Self {
        Self {
            created_at,
            records,
            translations,
        }
    }

    /// File name this backup is stored under, e.g.
    /// `backup_2024-05-01_120000.json`
    pub fn file_name(&self) -> String {
        format!(
            "{}{}.{}",
            BACKUP_PREFIX,
            self.created_at.format(TIMESTAMP_FORMAT),
            BACKUP_EXTENSION
        )
    }

    /// Load a backup from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Write the backup into `dir`, creating it if needed
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(self.file_name());
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;

        log::info!(
            "wrote backup of {} heroes to {}",
            self.records.len(),
            path.display()
        );
        Ok(path)
    }
}

/// A backup found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub path: PathBuf,
    /// Creation time taken from the file name
    pub created_at: DateTime<Utc>,
}

/// Creation time encoded in a backup file name, if it is one
pub fn parse_backup_name(file_name: &str) -> Option<DateTime<Utc>> {
    let stem = file_name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_EXTENSION)?
        .strip_suffix('.')?;
    NaiveDateTime::parse_from_str(stem, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// List the backups directly inside `dir`, newest first
///
/// A directory that does not exist holds no backups.
pub fn find_backups<P: AsRef<Path>>(dir: P) -> Result<Vec<BackupEntry>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let parsed = entry.file_name().to_str().and_then(parse_backup_name);
        if let Some(created_at) = parsed {
            found.push(BackupEntry {
                path: entry.path().to_path_buf(),
                created_at,
            });
        }
    }

    found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.path.cmp(&a.path)));
    Ok(found)
}

/// The newest backup in `dir`
pub fn latest_backup<P: AsRef<Path>>(dir: P) -> Result<Option<BackupEntry>> {
    Ok(find_backups(dir)?.into_iter().next())
}
