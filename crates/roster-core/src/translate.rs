//! Machine translation of sheet commentary
//!
//! Ranking and priority comments are written in the source sheets'
//! language. Backfilling replaces them with translations, cached by source
//! text so that each distinct comment is translated once.

use crate::error::{Error, Result};
use crate::record::HeroRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Something that can translate a piece of commentary
pub trait Translator {
    fn translate(&self, text: &str) -> Result<String>;
}

impl<F> Translator for F
where
    F: Fn(&str) -> Result<String>,
{
    fn translate(&self, text: &str) -> Result<String> {
        self(text)
    }
}

/// Translations by source text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationCache {
    entries: HashMap<String, String>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries.get(text).map(|s| s.as_str())
    }

    pub fn insert(&mut self, text: impl Into<String>, translation: impl Into<String>) {
        self.entries.insert(text.into(), translation.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a cache from JSON, or create empty if not exists
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

    /// Cached translation of `text`, asking `translator` on a miss
    fn resolve(&mut self, text: &str, translator: &dyn Translator) -> Result<(String, bool)> {
        if let Some(hit) = self.get(text) {
            return Ok((hit.to_string(), true));
        }
        let translated = translator.translate(text)?;
        self.insert(text, translated.clone());
        Ok((translated, false))
    }
}

/// A comment that could not be translated
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationFailure {
    pub key: String,
    /// Index of the build, or `None` for the ranking comment
    pub build: Option<usize>,
    pub message: String,
}

/// Outcome of a translation backfill
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationReport {
    /// Comments replaced by their translation
    pub translated: usize,
    /// How many of those came from the cache
    pub cache_hits: usize,
    pub failures: Vec<TranslationFailure>,
}

/// Translate every non-empty comment that is not yet translated
///
/// A failing comment is reported and left as it was; the others are still
/// translated.
pub fn backfill_translations(
    records: &mut [HeroRecord],
    translator: &dyn Translator,
    cache: &mut TranslationCache,
) -> TranslationReport {
    let mut report = TranslationReport::default();

    for record in records.iter_mut() {
        if !record.ranking_comment_translated && !record.ranking_comment.trim().is_empty() {
            match cache.resolve(&record.ranking_comment, translator) {
                Ok((text, hit)) => {
                    record.ranking_comment = text;
                    record.ranking_comment_translated = true;
                    report.translated += 1;
                    report.cache_hits += usize::from(hit);
                }
                Err(e) => report.failures.push(TranslationFailure {
                    key: record.key.clone(),
                    build: None,
                    message: e.to_string(),
                }),
            }
        }

        for (idx, build) in record.builds.iter_mut().enumerate() {
            if build.priority_comment_translated || build.priority_comment.trim().is_empty() {
                continue;
            }
            match cache.resolve(&build.priority_comment, translator) {
                Ok((text, hit)) => {
                    build.priority_comment = text;
                    build.priority_comment_translated = true;
                    report.translated += 1;
                    report.cache_hits += usize::from(hit);
                }
                Err(e) => report.failures.push(TranslationFailure {
                    key: record.key.clone(),
                    build: Some(idx),
                    message: e.to_string(),
                }),
            }
        }
    }

    for failure in &report.failures {
        log::warn!("could not translate comment of '{}': {}", failure.key, failure.message);
    }
    log::info!(
        "translated {} comments ({} from cache, {} failed)",
        report.translated,
        report.cache_hits,
        report.failures.len()
    );

    report
}
