//! Hero records: the entities that the roster database stores

use crate::nodes::EngravingNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Faction used when the metadata table has none
pub const UNKNOWN_FACTION: &str = "Unknown";

/// Localized name given to heroes added by hand
pub const PLACEHOLDER_HERO_NAME: &str = "New Hero";

/// Key prefix of heroes added by hand
pub const LOCAL_KEY_PREFIX: &str = "local-hero-";

/// Ranking bucket, best first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Tier {
    #[serde(rename = "SSS")]
    Sss,
    #[serde(rename = "SS")]
    Ss,
    S,
    A,
    B,
    C,
    D,
    #[default]
    #[serde(rename = "N/A")]
    NotRanked,
}

impl Tier {
    /// Every tier in rank order
    pub const ALL: [Tier; 8] = [
        Tier::Sss,
        Tier::Ss,
        Tier::S,
        Tier::A,
        Tier::B,
        Tier::C,
        Tier::D,
        Tier::NotRanked,
    ];

    /// Parse a sheet label; anything unrecognised is `NotRanked`
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "SSS" => Tier::Sss,
            "SS" => Tier::Ss,
            "S" => Tier::S,
            "A" => Tier::A,
            "B" => Tier::B,
            "C" => Tier::C,
            "D" => Tier::D,
            _ => Tier::NotRanked,
        }
    }

    /// Label as written in the sheet
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Sss => "SSS",
            Tier::Ss => "SS",
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
            Tier::NotRanked => "N/A",
        }
    }

    /// Score suggested for a hand-added hero placed in this tier
    pub fn default_score(&self) -> f64 {
        match self {
            Tier::Sss => 6.5,
            Tier::Ss => 5.0,
            Tier::S => 4.0,
            Tier::A => 3.0,
            Tier::B => 2.0,
            Tier::C => 1.01,
            Tier::D => 0.5,
            Tier::NotRanked => 0.0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a portrait image has been resolved for a hero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortraitStatus {
    #[default]
    Pending,
    Found,
    Missing,
}

/// Where a record's identity comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lineage {
    /// Backed by the source sheets and present in the latest fetch
    #[default]
    Linked,
    /// Backed by the source sheets but absent from the latest fetch
    Removed,
    /// Created by the user; the key is synthetic
    LocalOnly,
}

impl Lineage {
    /// True for identities that come from the source sheets
    pub fn is_linked(&self) -> bool {
        matches!(self, Lineage::Linked | Lineage::Removed)
    }

    /// Lifecycle status shown to users
    pub fn status(&self) -> LifecycleStatus {
        match self {
            Lineage::Removed => LifecycleStatus::RemovedFromSource,
            Lineage::Linked | Lineage::LocalOnly => LifecycleStatus::Active,
        }
    }
}

/// Lifecycle status derived from [`Lineage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Active,
    RemovedFromSource,
}

/// One recommended build of a hero
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildVariant {
    /// Tier/group label the build is listed under
    pub group: String,
    /// Priority commentary
    pub priority_comment: String,
    /// Whether `priority_comment` has been machine-translated
    #[serde(default)]
    pub priority_comment_translated: bool,
    /// Required signature item level
    pub si_level: u32,
    /// Required furniture level
    pub furniture_level: u32,
    /// Required engraving level
    pub engraving_level: u32,
    /// Engraving upgrade sequence, in order
    pub engraving_nodes: Vec<EngravingNode>,
    /// False for the primary build, true for upgrade/secondary variants
    pub is_alternative: bool,
}

/// A hero in the roster database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroRecord {
    /// Stable identity key
    pub key: String,
    /// Name in the source sheets' language
    pub origin_name: String,
    /// Localized name, empty when untranslated
    pub localized_name: String,
    pub faction: String,
    pub awakened: bool,
    pub tier: Tier,
    pub score: f64,
    pub ranking_comment: String,
    #[serde(default)]
    pub ranking_comment_translated: bool,
    pub builds: Vec<BuildVariant>,

    // Local-only metadata
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub user_modified: bool,
    #[serde(default)]
    pub portrait: PortraitStatus,
    #[serde(default)]
    pub lineage: Lineage,
    /// Latest source values of fields that differ from the stored ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffSet>,
}

impl HeroRecord {
    /// A source-backed record with no ranking or builds yet
    pub fn linked(key: impl Into<String>, origin_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            origin_name: origin_name.into(),
            localized_name: String::new(),
            faction: UNKNOWN_FACTION.to_string(),
            awakened: false,
            tier: Tier::NotRanked,
            score: 0.0,
            ranking_comment: String::new(),
            ranking_comment_translated: false,
            builds: Vec::new(),
            hidden: false,
            user_modified: false,
            portrait: PortraitStatus::Pending,
            lineage: Lineage::Linked,
            diff: None,
        }
    }

    /// A hand-added record with a synthetic key derived from `now`
    pub fn new_local(now: DateTime<Utc>) -> Self {
        Self {
            key: format!("{}{}", LOCAL_KEY_PREFIX, now.timestamp_millis()),
            origin_name: String::new(),
            localized_name: PLACEHOLDER_HERO_NAME.to_string(),
            user_modified: true,
            portrait: PortraitStatus::Missing,
            lineage: Lineage::LocalOnly,
            ..Self::linked("", "")
        }
    }

    /// Lifecycle status derived from the lineage
    pub fn status(&self) -> LifecycleStatus {
        self.lineage.status()
    }

    /// True for records created by the user
    pub fn is_local_only(&self) -> bool {
        self.lineage == Lineage::LocalOnly
    }

    /// True when the source disagrees with at least one stored field
    pub fn has_mismatches(&self) -> bool {
        self.diff.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// Localized name usable for promotion matching: trimmed, and neither
    /// empty nor the placeholder
    pub fn promotable_name(&self) -> Option<&str> {
        let name = self.localized_name.trim();
        if name.is_empty() || name == PLACEHOLDER_HERO_NAME {
            None
        } else {
            Some(name)
        }
    }

    /// Replace every source-tracked field with the values of `source`
    pub fn adopt_source_fields(&mut self, source: &HeroRecord) {
        self.origin_name = source.origin_name.clone();
        self.localized_name = source.localized_name.clone();
        self.faction = source.faction.clone();
        self.awakened = source.awakened;
        self.tier = source.tier;
        self.score = source.score;
        self.ranking_comment = source.ranking_comment.clone();
        self.ranking_comment_translated = source.ranking_comment_translated;
        self.builds = source.builds.clone();
    }
}

/// Top-level fields compared between stored and fetched records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    OriginName,
    LocalizedName,
    Faction,
    Awakened,
    Tier,
    Score,
    RankingComment,
    Builds,
}

impl TrackedField {
    pub const ALL: [TrackedField; 8] = [
        TrackedField::OriginName,
        TrackedField::LocalizedName,
        TrackedField::Faction,
        TrackedField::Awakened,
        TrackedField::Tier,
        TrackedField::Score,
        TrackedField::RankingComment,
        TrackedField::Builds,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TrackedField::OriginName => "origin_name",
            TrackedField::LocalizedName => "localized_name",
            TrackedField::Faction => "faction",
            TrackedField::Awakened => "awakened",
            TrackedField::Tier => "tier",
            TrackedField::Score => "score",
            TrackedField::RankingComment => "ranking_comment",
            TrackedField::Builds => "builds",
        }
    }

    /// Parse a field name as printed by [`TrackedField::name`]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source values of the tracked fields that differ from the stored record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiffSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awakened: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builds: Option<Vec<BuildVariant>>,
}

impl DiffSet {
    /// Check if no field differs
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Fields present in this set, in declaration order
    pub fn fields(&self) -> Vec<TrackedField> {
        TrackedField::ALL
            .into_iter()
            .filter(|f| self.contains(*f))
            .collect()
    }

    pub fn contains(&self, field: TrackedField) -> bool {
        match field {
            TrackedField::OriginName => self.origin_name.is_some(),
            TrackedField::LocalizedName => self.localized_name.is_some(),
            TrackedField::Faction => self.faction.is_some(),
            TrackedField::Awakened => self.awakened.is_some(),
            TrackedField::Tier => self.tier.is_some(),
            TrackedField::Score => self.score.is_some(),
            TrackedField::RankingComment => self.ranking_comment.is_some(),
            TrackedField::Builds => self.builds.is_some(),
        }
    }

    /// Drop one field from the set
    pub fn remove(&mut self, field: TrackedField) {
        match field {
            TrackedField::OriginName => self.origin_name = None,
            TrackedField::LocalizedName => self.localized_name = None,
            TrackedField::Faction => self.faction = None,
            TrackedField::Awakened => self.awakened = None,
            TrackedField::Tier => self.tier = None,
            TrackedField::Score => self.score = None,
            TrackedField::RankingComment => self.ranking_comment = None,
            TrackedField::Builds => self.builds = None,
        }
    }

    /// Write the source value of `field` into `record`, if present.
    /// Returns whether anything was written.
    pub fn apply_field(&self, field: TrackedField, record: &mut HeroRecord) -> bool {
        match field {
            TrackedField::OriginName => assign(&self.origin_name, &mut record.origin_name),
            TrackedField::LocalizedName => {
                assign(&self.localized_name, &mut record.localized_name)
            }
            TrackedField::Faction => assign(&self.faction, &mut record.faction),
            TrackedField::Awakened => assign(&self.awakened, &mut record.awakened),
            TrackedField::Tier => assign(&self.tier, &mut record.tier),
            TrackedField::Score => assign(&self.score, &mut record.score),
            TrackedField::RankingComment => {
                let written = assign(&self.ranking_comment, &mut record.ranking_comment);
                if written {
                    record.ranking_comment_translated = false;
                }
                written
            }
            TrackedField::Builds => assign(&self.builds, &mut record.builds),
        }
    }
}

fn assign<T: Clone>(source: &Option<T>, target: &mut T) -> bool {
    match source {
        Some(value) => {
            *target = value.clone();
            true
        }
        None => false,
    }
}
