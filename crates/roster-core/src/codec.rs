//! Decoder for the compact investment notation used in build cells
//!
//! A cell looks like `309e60УСК>МУ`: the digits before the `e` are the
//! signature item level (two digits) and the furniture level (one digit),
//! the digits right after it are the engraving level, and the rest is the
//! engraving upgrade path. Several builds can share one cell, separated by
//! `/`; everything after the first is an alternative build.
//!
//! Cells are typed by hand, so decoding never fails: anything that does not
//! parse becomes zero or an untranslated node.

use crate::nodes::{EngravingNode, NodeDictionary};
use crate::record::BuildVariant;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Characters separating the SI/furniture prefix from the engraving part:
/// Latin `e` and Cyrillic `е`
pub const LEVEL_SEPARATORS: [char; 2] = ['e', 'е'];

/// Separator between the primary build and its alternatives
pub const VARIANT_SEPARATOR: char = '/';

/// SI level at which inherited alternatives assume furniture 9
const MAX_SI_LEVEL: u32 = 30;

/// Levels and upgrade path decoded from one investment string
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Investment {
    pub si_level: u32,
    pub furniture_level: u32,
    pub engraving_level: u32,
    pub nodes: Vec<EngravingNode>,
}

/// One build decoded from a cell, before it is attached to a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedVariant {
    pub investment: Investment,
    pub is_alternative: bool,
}

impl DecodedVariant {
    /// Attach the build to a tier/group and its commentary
    pub fn into_build(self, group: &str, priority_comment: &str) -> BuildVariant {
        BuildVariant {
            group: group.to_string(),
            priority_comment: priority_comment.to_string(),
            priority_comment_translated: false,
            si_level: self.investment.si_level,
            furniture_level: self.investment.furniture_level,
            engraving_level: self.investment.engraving_level,
            engraving_nodes: self.investment.nodes,
            is_alternative: self.is_alternative,
        }
    }
}

/// Investment decoder bound to a node dictionary
#[derive(Debug, Clone, Default)]
pub struct InvestmentCodec {
    dictionary: NodeDictionary,
}

impl InvestmentCodec {
    pub fn new(dictionary: NodeDictionary) -> Self {
        Self { dictionary }
    }

    /// Decode a single investment string (no `/` handling)
    pub fn parse_segment(&self, raw: &str) -> Investment {
        if raw.trim().is_empty() {
            return Investment::default();
        }

        let separator = raw
            .char_indices()
            .find(|(_, c)| LEVEL_SEPARATORS.contains(c));
        let (prefix, engraving_part) = match separator {
            Some((idx, c)) => (&raw[..idx], Some(&raw[idx + c.len_utf8()..])),
            None => (raw, None),
        };

        let digits: String = prefix.chars().filter(char::is_ascii_digit).collect();
        let si_level = digits.get(..2).map(parse_level).unwrap_or(0);
        let furniture_level = digits.get(2..3).map(parse_level).unwrap_or(0);

        let mut investment = Investment {
            si_level,
            furniture_level,
            ..Investment::default()
        };

        if let Some(part) = engraving_part {
            let part = part.trim();
            let digits_end = part
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(part.len());
            // Nodes only count when an engraving level is written
            if digits_end > 0 {
                investment.engraving_level = parse_level(&part[..digits_end]);
                investment.nodes = self.parse_nodes(&part[digits_end..]);
            }
        }

        investment
    }

    /// Split an upgrade path on `->` or `>` and look every step up
    pub fn parse_nodes(&self, path: &str) -> Vec<EngravingNode> {
        path.trim()
            .replace("->", ">")
            .split('>')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| self.dictionary.node(part))
            .collect()
    }

    /// Decode a whole cell, alternatives included
    ///
    /// With several `/`-separated segments, every variant takes the node
    /// path of the last segment, and an alternative that starts directly with
    /// the separator inherits the primary SI level as its prefix.
    pub fn decode(&self, cell: &str) -> Vec<DecodedVariant> {
        let cell = cell.trim();
        if !cell.contains(VARIANT_SEPARATOR) {
            return vec![DecodedVariant {
                investment: self.parse_segment(cell),
                is_alternative: false,
            }];
        }

        let segments: Vec<&str> = cell.split(VARIANT_SEPARATOR).collect();
        let shared_nodes = segments
            .last()
            .map(|last| self.parse_segment(last).nodes)
            .unwrap_or_default();

        let primary = self.parse_segment(segments[0].trim());
        let base_si = primary.si_level;

        let mut variants = Vec::with_capacity(segments.len());
        variants.push(DecodedVariant {
            investment: Investment {
                nodes: shared_nodes.clone(),
                ..primary
            },
            is_alternative: false,
        });

        for segment in &segments[1..] {
            let segment = inherit_prefix(segment.trim(), base_si);
            let investment = self.parse_segment(&segment);
            variants.push(DecodedVariant {
                investment: Investment {
                    nodes: shared_nodes.clone(),
                    ..investment
                },
                is_alternative: true,
            });
        }

        variants
    }

    /// Decode a cell into builds listed under `group`
    pub fn decode_builds(&self, group: &str, priority_comment: &str, cell: &str) -> Vec<BuildVariant> {
        self.decode(cell)
            .into_iter()
            .map(|variant| variant.into_build(group, priority_comment))
            .collect()
    }
}

/// Decode a raw cell with the built-in node dictionary
///
/// The builds carry no group or commentary; callers that know them should
/// use [`InvestmentCodec::decode_builds`].
pub fn decode_investment(cell: &str) -> Vec<BuildVariant> {
    InvestmentCodec::default().decode_builds("", "", cell)
}

/// Prepend the inherited SI/furniture prefix to an alternative that omits it
fn inherit_prefix(segment: &str, base_si: u32) -> Cow<'_, str> {
    if segment.starts_with(&LEVEL_SEPARATORS[..]) {
        let furniture = if base_si == MAX_SI_LEVEL { '9' } else { '0' };
        Cow::Owned(format!("{:02}{}{}", base_si, furniture, segment))
    } else {
        Cow::Borrowed(segment)
    }
}

fn parse_level(digits: &str) -> u32 {
    digits.parse().unwrap_or(0)
}
