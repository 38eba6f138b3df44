//! Persistence of the roster between syncs

use crate::error::{Error, Result};
use crate::record::HeroRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where the current generation of records lives
pub trait RecordStore {
    /// The stored records; empty before the first sync
    fn load(&self) -> Result<Vec<HeroRecord>>;

    /// Replace the stored records with a new generation
    fn save(&self, records: &[HeroRecord]) -> Result<()>;
}

/// Records kept as a pretty JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Result<Vec<HeroRecord>> {
        if !self.path.exists() {
            log::debug!("{} does not exist yet, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| Error::FileRead {
            path: self.path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Written to a sibling temp file first, then renamed over the store
    fn save(&self, records: &[HeroRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(records)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        log::debug!("saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// In-memory store, for tests and embedders that persist elsewhere
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<HeroRecord>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new(records: Vec<HeroRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            saves: Mutex::new(0),
        }
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Vec<HeroRecord>> {
        Ok(self.records.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, records: &[HeroRecord]) -> Result<()> {
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = records.to_vec();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
