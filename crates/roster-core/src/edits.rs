//! User edits to the stored roster
//!
//! This module provides:
//! - Field edits that mark a record as user-modified
//! - Accepting source values held in a record's diff
//! - Adding and deleting hand-made heroes
//! - An edit file format (JSON) for applying edits in bulk

use crate::error::{Error, Result};
use crate::record::{BuildVariant, HeroRecord, Tier, TrackedField};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A new value for one field of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    OriginName(String),
    LocalizedName(String),
    Faction(String),
    Awakened(bool),
    Tier(Tier),
    Score(f64),
    RankingComment(String),
    Builds(Vec<BuildVariant>),
    /// Display state only; does not mark the record as modified
    Hidden(bool),
}

impl FieldEdit {
    /// The source-tracked field this edit overrides, if any
    pub fn tracked_field(&self) -> Option<TrackedField> {
        match self {
            FieldEdit::OriginName(_) => Some(TrackedField::OriginName),
            FieldEdit::LocalizedName(_) => Some(TrackedField::LocalizedName),
            FieldEdit::Faction(_) => Some(TrackedField::Faction),
            FieldEdit::Awakened(_) => Some(TrackedField::Awakened),
            FieldEdit::Tier(_) => Some(TrackedField::Tier),
            FieldEdit::Score(_) => Some(TrackedField::Score),
            FieldEdit::RankingComment(_) => Some(TrackedField::RankingComment),
            FieldEdit::Builds(_) => Some(TrackedField::Builds),
            FieldEdit::Hidden(_) => None,
        }
    }
}

fn find_mut<'a>(records: &'a mut [HeroRecord], key: &str) -> Result<&'a mut HeroRecord> {
    records
        .iter_mut()
        .find(|r| r.key == key)
        .ok_or_else(|| Error::UnknownRecord(key.to_string()))
}

/// Drop `field` from the record's diff, and the diff itself once empty
fn settle_diff(record: &mut HeroRecord, field: TrackedField) {
    if let Some(diff) = record.diff.as_mut() {
        diff.remove(field);
        if diff.is_empty() {
            record.diff = None;
        }
    }
}

/// Apply a user edit to the record with `key`
pub fn apply_edit(records: &mut [HeroRecord], key: &str, edit: FieldEdit) -> Result<()> {
    let record = find_mut(records, key)?;
    let field = edit.tracked_field();

    match edit {
        FieldEdit::OriginName(value) => record.origin_name = value,
        FieldEdit::LocalizedName(value) => record.localized_name = value,
        FieldEdit::Faction(value) => record.faction = value,
        FieldEdit::Awakened(value) => record.awakened = value,
        FieldEdit::Tier(tier) => {
            // Hand-added heroes follow their tier's suggested score until
            // the user sets one
            let old = record.tier;
            if record.is_local_only()
                && (record.score == 0.0 || record.score == old.default_score())
            {
                record.score = tier.default_score();
            }
            record.tier = tier;
        }
        FieldEdit::Score(score) => {
            if !score.is_finite() {
                return Err(Error::InvalidEdit {
                    key: key.to_string(),
                    message: format!("score must be a finite number, got {}", score),
                });
            }
            record.score = score;
        }
        FieldEdit::RankingComment(value) => {
            record.ranking_comment = value;
            record.ranking_comment_translated = false;
        }
        FieldEdit::Builds(builds) => record.builds = builds,
        FieldEdit::Hidden(hidden) => record.hidden = hidden,
    }

    if let Some(field) = field {
        record.user_modified = true;
        settle_diff(record, field);
    }
    Ok(())
}

/// Take the source value of one differing field as a user edit.
/// Returns false when the field does not differ.
pub fn accept_field(records: &mut [HeroRecord], key: &str, field: TrackedField) -> Result<bool> {
    let record = find_mut(records, key)?;
    let Some(diff) = record.diff.take() else {
        return Ok(false);
    };

    let accepted = diff.apply_field(field, record);
    record.diff = Some(diff);
    if accepted {
        record.user_modified = true;
        settle_diff(record, field);
    }
    Ok(accepted)
}

/// Take every differing source value. Returns the number of fields taken.
pub fn accept_all(records: &mut [HeroRecord], key: &str) -> Result<usize> {
    let record = find_mut(records, key)?;
    let Some(diff) = record.diff.take() else {
        return Ok(0);
    };

    let fields = diff.fields();
    for field in &fields {
        diff.apply_field(*field, record);
    }
    if !fields.is_empty() {
        record.user_modified = true;
    }
    Ok(fields.len())
}

/// Add a hand-made hero at the front of the roster and return its key
pub fn add_local_hero(records: &mut Vec<HeroRecord>, now: DateTime<Utc>) -> String {
    let mut at = now;
    let mut record = HeroRecord::new_local(at);
    while records.iter().any(|r| r.key == record.key) {
        at += Duration::milliseconds(1);
        record = HeroRecord::new_local(at);
    }

    let key = record.key.clone();
    log::info!("added local hero '{}'", key);
    records.insert(0, record);
    key
}

/// Remove a hero from the roster for good
pub fn delete_hero(records: &mut Vec<HeroRecord>, key: &str) -> Result<HeroRecord> {
    let idx = records
        .iter()
        .position(|r| r.key == key)
        .ok_or_else(|| Error::UnknownRecord(key.to_string()))?;
    log::info!("deleted hero '{}'", key);
    Ok(records.remove(idx))
}

/// One edit addressed to a record key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedEdit {
    pub key: String,
    pub edit: FieldEdit,
}

impl KeyedEdit {
    pub fn new(key: impl Into<String>, edit: FieldEdit) -> Self {
        Self {
            key: key.into(),
            edit,
        }
    }
}

/// An edit file: edits applied in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditFile {
    pub edits: Vec<KeyedEdit>,
}

impl EditFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edit(&mut self, edit: KeyedEdit) {
        self.edits.push(edit);
    }

    /// Load an edit file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the edit file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Outcome of applying an edit file
#[derive(Debug, Clone, Default)]
pub struct EditReport {
    /// Number of edits applied
    pub applied: usize,
    /// Edits that failed, with the reason
    pub failed: Vec<(KeyedEdit, String)>,
}

/// Apply every edit of `file`; a failing edit is reported and skipped
pub fn apply_edit_file(records: &mut [HeroRecord], file: &EditFile) -> EditReport {
    let mut report = EditReport::default();

    for keyed in &file.edits {
        match apply_edit(records, &keyed.key, keyed.edit.clone()) {
            Ok(()) => report.applied += 1,
            Err(e) => {
                log::warn!("skipping edit for '{}': {}", keyed.key, e);
                report.failed.push((keyed.clone(), e.to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_investment;
    use crate::record::{DiffSet, Lineage, PortraitStatus, PLACEHOLDER_HERO_NAME, UNKNOWN_FACTION};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn with_diff() -> Vec<HeroRecord> {
        let mut record = HeroRecord::linked("Тал", "Тал");
        record.tier = Tier::A;
        record.score = 3.0;
        record.diff = Some(DiffSet {
            tier: Some(Tier::S),
            score: Some(4.0),
            ranking_comment: Some("better now".to_string()),
            ..Default::default()
        });
        vec![record]
    }

    #[test]
    fn test_edit_marks_modified_and_drops_diff_field() {
        let mut records = with_diff();
        apply_edit(&mut records, "Тал", FieldEdit::Tier(Tier::B)).unwrap();

        let record = &records[0];
        assert_eq!(record.tier, Tier::B);
        assert_eq!(record.score, 3.0);
        assert!(record.user_modified);
        assert_eq!(
            record.diff.as_ref().unwrap().fields(),
            vec![TrackedField::Score, TrackedField::RankingComment]
        );
    }

    #[test]
    fn test_edit_last_diff_field_clears_diff() {
        let mut records = vec![HeroRecord::linked("Тал", "Тал")];
        records[0].diff = Some(DiffSet {
            faction: Some("Wilder".to_string()),
            ..Default::default()
        });
        apply_edit(&mut records, "Тал", FieldEdit::Faction("Maulers".into())).unwrap();
        assert!(records[0].diff.is_none());
        assert!(!records[0].has_mismatches());
    }

    #[test]
    fn test_hidden_edit_is_not_a_modification() {
        let mut records = with_diff();
        apply_edit(&mut records, "Тал", FieldEdit::Hidden(true)).unwrap();
        assert!(records[0].hidden);
        assert!(!records[0].user_modified);
        assert_eq!(records[0].diff.as_ref().unwrap().fields().len(), 3);
    }

    #[test]
    fn test_local_tier_edit_follows_default_score() {
        let mut records = Vec::new();
        let key = add_local_hero(&mut records, now());

        apply_edit(&mut records, &key, FieldEdit::Tier(Tier::Ss)).unwrap();
        assert_eq!(records[0].score, 5.0);

        apply_edit(&mut records, &key, FieldEdit::Tier(Tier::C)).unwrap();
        assert_eq!(records[0].score, 1.01);

        apply_edit(&mut records, &key, FieldEdit::Score(2.5)).unwrap();
        apply_edit(&mut records, &key, FieldEdit::Tier(Tier::Sss)).unwrap();
        assert_eq!(records[0].score, 2.5);
    }

    #[test]
    fn test_linked_tier_edit_keeps_score() {
        let mut records = vec![HeroRecord::linked("Тал", "Тал")];
        apply_edit(&mut records, "Тал", FieldEdit::Tier(Tier::S)).unwrap();
        assert_eq!(records[0].score, 0.0);
    }

    #[test]
    fn test_invalid_score_rejected() {
        let mut records = with_diff();
        let err = apply_edit(&mut records, "Тал", FieldEdit::Score(f64::NAN)).unwrap_err();
        assert!(matches!(err, Error::InvalidEdit { .. }));
        assert_eq!(records[0].score, 3.0);
        assert!(!records[0].user_modified);
    }

    #[test]
    fn test_unknown_key() {
        let mut records = with_diff();
        let err = apply_edit(&mut records, "nobody", FieldEdit::Hidden(true)).unwrap_err();
        assert!(matches!(err, Error::UnknownRecord(ref k) if k == "nobody"));
    }

    #[test]
    fn test_accept_field() {
        let mut records = with_diff();
        records[0].ranking_comment_translated = true;

        assert!(accept_field(&mut records, "Тал", TrackedField::RankingComment).unwrap());
        let record = &records[0];
        assert_eq!(record.ranking_comment, "better now");
        assert!(!record.ranking_comment_translated);
        assert!(record.user_modified);
        assert!(!record.diff.as_ref().unwrap().contains(TrackedField::RankingComment));

        assert!(!accept_field(&mut records, "Тал", TrackedField::Builds).unwrap());
    }

    #[test]
    fn test_accept_field_without_diff() {
        let mut records = vec![HeroRecord::linked("Тал", "Тал")];
        assert!(!accept_field(&mut records, "Тал", TrackedField::Tier).unwrap());
        assert!(!records[0].user_modified);
        assert!(records[0].diff.is_none());
    }

    #[test]
    fn test_accept_all() {
        let mut records = with_diff();
        assert_eq!(accept_all(&mut records, "Тал").unwrap(), 3);

        let record = &records[0];
        assert_eq!(record.tier, Tier::S);
        assert_eq!(record.score, 4.0);
        assert_eq!(record.ranking_comment, "better now");
        assert!(record.user_modified);
        assert!(record.diff.is_none());

        assert_eq!(accept_all(&mut records, "Тал").unwrap(), 0);
    }

    #[test]
    fn test_accept_all_builds() {
        let mut records = vec![HeroRecord::linked("Тал", "Тал")];
        let builds = decode_investment("30e60УСК");
        records[0].diff = Some(DiffSet {
            builds: Some(builds.clone()),
            ..Default::default()
        });
        accept_all(&mut records, "Тал").unwrap();
        assert_eq!(records[0].builds, builds);
    }

    #[test]
    fn test_add_local_hero() {
        let mut records = with_diff();
        let key = add_local_hero(&mut records, now());

        assert_eq!(records.len(), 2);
        let record = &records[0];
        assert_eq!(record.key, key);
        assert_eq!(record.lineage, Lineage::LocalOnly);
        assert_eq!(record.localized_name, PLACEHOLDER_HERO_NAME);
        assert_eq!(record.faction, UNKNOWN_FACTION);
        assert_eq!(record.tier, Tier::NotRanked);
        assert_eq!(record.portrait, PortraitStatus::Missing);
        assert!(record.user_modified);
    }

    #[test]
    fn test_add_local_hero_same_instant_gets_distinct_keys() {
        let mut records = Vec::new();
        let first = add_local_hero(&mut records, now());
        let second = add_local_hero(&mut records, now());
        assert_ne!(first, second);
        assert_eq!(records[0].key, second);
    }

    #[test]
    fn test_delete_hero() {
        let mut records = with_diff();
        add_local_hero(&mut records, now());

        let removed = delete_hero(&mut records, "Тал").unwrap();
        assert_eq!(removed.key, "Тал");
        assert_eq!(records.len(), 1);
        assert!(delete_hero(&mut records, "Тал").is_err());
    }

    #[test]
    fn test_edit_json_format() {
        let edit = KeyedEdit::new("Тал", FieldEdit::Tier(Tier::Ss));
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"key": "Тал", "edit": {"field": "tier", "value": "SS"}})
        );
    }

    #[test]
    fn test_edit_file_roundtrip_and_apply() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edits.json");

        let mut file = EditFile::new();
        file.add_edit(KeyedEdit::new("Тал", FieldEdit::LocalizedName("Thal".into())));
        file.add_edit(KeyedEdit::new("ghost", FieldEdit::Awakened(true)));
        file.add_edit(KeyedEdit::new("Тал", FieldEdit::Awakened(true)));
        file.save(&path).unwrap();

        let loaded = EditFile::load(&path).unwrap();
        assert_eq!(loaded, file);

        let mut records = with_diff();
        let report = apply_edit_file(&mut records, &loaded);
        assert_eq!(report.applied, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.key, "ghost");
        assert_eq!(records[0].localized_name, "Thal");
        assert!(records[0].awakened);
    }
}
