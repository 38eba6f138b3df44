//! Typed views over sheet rows
//!
//! Columns are addressed by position only; the sheets have no reliable
//! header names. All indices live here so that a layout change in the
//! source is a one-file fix.

use crate::table::Row;
use regex::Regex;
use std::sync::LazyLock;

/// Column positions of the metadata (translation) table
pub mod metadata {
    pub const LOCALIZED_NAME: usize = 3;
    pub const ORIGIN_NAME: usize = 4;
    pub const FACTION: usize = 12;
    pub const AWAKENED: usize = 13;

    /// Rows must reach past the origin-name column to be considered
    pub const MIN_CELLS: usize = ORIGIN_NAME + 1;
}

/// Column positions of the builds table
pub mod builds {
    pub const ORIGIN_NAME: usize = 3;
    pub const INVESTMENT: usize = 5;
    pub const COMMENT: usize = 7;
    pub const TIER_OR_GROUP: usize = 8;
    pub const SCORE: usize = 9;
}

/// Header label that the builds sheet repeats in the tier/group column of
/// its ranking rows
pub const RANKING_ROW_SENTINEL: &str = "Ранг";

/// A metadata row: names, faction and awakened flag of one hero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataRow<'a> {
    pub localized_name: &'a str,
    pub origin_name: &'a str,
    pub faction: &'a str,
    pub awakened: bool,
}

impl<'a> MetadataRow<'a> {
    /// View a row, or `None` when it is too short to name a hero
    pub fn from_row(row: &'a Row) -> Option<Self> {
        if row.len() < metadata::MIN_CELLS {
            return None;
        }
        Some(Self {
            localized_name: row.get(metadata::LOCALIZED_NAME).trim(),
            origin_name: row.get(metadata::ORIGIN_NAME).trim(),
            faction: row.get(metadata::FACTION).trim(),
            awakened: row.get(metadata::AWAKENED).trim().eq_ignore_ascii_case("TRUE"),
        })
    }
}

/// Tier/group label of rows whose investment cell is never decoded
pub const EXCLUDED_BUILD_GROUP: &str = "I";

/// Ranking cells of a builds row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingCells<'a> {
    pub tier_label: &'a str,
    pub score: f64,
    pub comment: &'a str,
}

/// Build cells of a builds row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildCells<'a> {
    pub group: &'a str,
    pub investment: &'a str,
    pub comment: &'a str,
}

/// A builds row: one hero identity plus what the row says about it
///
/// The tier/group column doubles as the hero's ranking tier and the group
/// its builds are listed under. Header repeats carry the sentinel there and
/// hold no ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildsRow<'a> {
    pub origin_name: &'a str,
    /// Tier, score and commentary; `None` on header repeats
    pub ranking: Option<RankingCells<'a>>,
    /// Investment cell to decode; `None` without group or investment, and
    /// for the excluded group
    pub build: Option<BuildCells<'a>>,
}

impl<'a> BuildsRow<'a> {
    /// View a row, or `None` when it names no hero
    pub fn from_row(row: &'a Row) -> Option<Self> {
        let origin_name = row.get(builds::ORIGIN_NAME).trim();
        if origin_name.is_empty() {
            return None;
        }

        let group = row.get(builds::TIER_OR_GROUP).trim();
        let investment = row.get(builds::INVESTMENT).trim();
        let comment = row.get(builds::COMMENT).trim();

        let ranking = (group != RANKING_ROW_SENTINEL).then(|| RankingCells {
            tier_label: group,
            score: parse_score(row.get(builds::SCORE)),
            comment,
        });

        let build = (!group.is_empty() && group != EXCLUDED_BUILD_GROUP && !investment.is_empty())
            .then_some(BuildCells {
                group,
                investment,
                comment,
            });

        Some(Self {
            origin_name,
            ranking,
            build,
        })
    }

    /// True for rows that repeat the sheet header
    pub fn is_header_repeat(&self) -> bool {
        self.ranking.is_none()
    }
}

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("number pattern is valid")
});

/// Parse a score cell from its leading number
///
/// A comma is accepted as decimal mark and trailing text such as `4.5*` is
/// ignored. Anything without a leading number is 0.
pub fn parse_score(raw: &str) -> f64 {
    let normalized = raw.trim().replacen(',', ".", 1);
    let Some(number) = LEADING_NUMBER.find(&normalized) else {
        return 0.0;
    };
    match number.as_str().parse::<f64>() {
        Ok(score) if score.is_finite() => score,
        _ => 0.0,
    }
}
