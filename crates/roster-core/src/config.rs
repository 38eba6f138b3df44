//! Sync configuration file

use crate::error::{Error, Result};
use crate::nodes::NodeDictionary;
use crate::parser::DEFAULT_DELIMITER;
use crate::source::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where to fetch from and where to keep things
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Metadata (translation) table: URL or file path
    pub metadata_source: String,
    /// Builds table: URL or file path
    pub builds_source: String,
    /// Cell delimiter of both tables
    pub delimiter: char,
    /// Roster store
    pub store_path: PathBuf,
    pub history_path: PathBuf,
    pub translations_path: PathBuf,
    pub backup_dir: PathBuf,
    pub http_timeout_secs: u64,
    /// Extra or corrected engraving node translations
    pub node_overrides: BTreeMap<String, String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            metadata_source: String::new(),
            builds_source: String::new(),
            delimiter: DEFAULT_DELIMITER as char,
            store_path: PathBuf::from("roster.json"),
            history_path: PathBuf::from("sync_history.json"),
            translations_path: PathBuf::from("translations.json"),
            backup_dir: PathBuf::from("backups"),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            node_overrides: BTreeMap::new(),
        }
    }
}

impl SyncConfig {
    /// Load a config file from JSON; missing keys take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.delimiter_byte()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// The delimiter as a byte; only ASCII delimiters are supported
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(Error::Config(format!(
                "delimiter must be an ASCII character, got '{}'",
                self.delimiter
            )))
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Built-in node translations with the overrides applied
    pub fn node_dictionary(&self) -> NodeDictionary {
        NodeDictionary::builtin().with_overrides(&self.node_overrides)
    }

    /// Both source locations, or an error naming the missing one
    pub fn sources(&self) -> Result<(&str, &str)> {
        let metadata = self.metadata_source.trim();
        let builds = self.builds_source.trim();
        if metadata.is_empty() {
            return Err(Error::Config("metadata_source is not set".to_string()));
        }
        if builds.is_empty() {
            return Err(Error::Config("builds_source is not set".to_string()));
        }
        Ok((metadata, builds))
    }
}
