//! Joins the metadata and builds tables into hero records

use crate::codec::InvestmentCodec;
use crate::columns::{BuildsRow, MetadataRow};
use crate::record::{HeroRecord, Tier, UNKNOWN_FACTION};
use crate::table::Table;
use std::collections::{BTreeMap, HashMap};

/// Key prefix of heroes that only have a localized name
pub const NO_ORIGIN_KEY_PREFIX: &str = "no-origin-name-";

/// Freshly assembled records by key.
/// A BTreeMap keeps iteration, and therefore reconciliation, deterministic.
pub type FreshRecords = BTreeMap<String, HeroRecord>;

/// Builds hero records from the two source tables
#[derive(Debug, Clone, Default)]
pub struct RecordAssembler {
    codec: InvestmentCodec,
}

impl RecordAssembler {
    pub fn new(codec: InvestmentCodec) -> Self {
        Self { codec }
    }

    /// Join `metadata` and `builds` (both with a header row) into records
    ///
    /// Every hero named by the builds table gets a record, enriched with
    /// names, faction and awakened flag from the metadata table. Heroes that
    /// only appear in the metadata table are added afterwards without
    /// builds.
    pub fn assemble(&self, metadata: &Table, builds: &Table) -> FreshRecords {
        // Later rows win, as they would in a lookup table
        let mut by_origin: HashMap<&str, MetadataRow<'_>> = HashMap::new();
        for row in metadata.body() {
            if let Some(view) = MetadataRow::from_row(row) {
                if !view.origin_name.is_empty() {
                    by_origin.insert(view.origin_name, view);
                }
            }
        }

        let mut records = FreshRecords::new();
        let mut ranking_rows = 0usize;
        let mut build_rows = 0usize;

        for row in builds.body() {
            let Some(view) = BuildsRow::from_row(row) else {
                continue;
            };

            let record = records
                .entry(view.origin_name.to_string())
                .or_insert_with(|| {
                    let mut record = HeroRecord::linked(view.origin_name, view.origin_name);
                    if let Some(meta) = by_origin.get(view.origin_name) {
                        apply_metadata(&mut record, meta);
                    }
                    record
                });

            if let Some(ranking) = view.ranking {
                record.tier = Tier::parse(ranking.tier_label);
                record.score = ranking.score;
                record.ranking_comment = ranking.comment.to_string();
                ranking_rows += 1;
            }
            if let Some(build) = view.build {
                record.builds.extend(self.codec.decode_builds(
                    build.group,
                    build.comment,
                    build.investment,
                ));
                build_rows += 1;
            }
        }

        let from_builds = records.len();

        for row in metadata.body() {
            let Some(view) = MetadataRow::from_row(row) else {
                continue;
            };

            if !view.origin_name.is_empty() {
                if !records.contains_key(view.origin_name) {
                    let mut record = HeroRecord::linked(view.origin_name, view.origin_name);
                    apply_metadata(&mut record, &view);
                    records.insert(view.origin_name.to_string(), record);
                }
            } else if !view.localized_name.is_empty() {
                let wanted = view.localized_name.to_lowercase();
                let already_known = records
                    .values()
                    .any(|r| r.localized_name.to_lowercase() == wanted);
                if already_known {
                    log::debug!(
                        "skipping metadata row for '{}': a hero with that name exists",
                        view.localized_name
                    );
                    continue;
                }

                let key = synthetic_key(view.localized_name);
                let mut record = HeroRecord::linked(key.clone(), "");
                apply_metadata(&mut record, &view);
                records.insert(key, record);
            }
        }

        log::info!(
            "assembled {} heroes ({} from builds, {} metadata only; {} ranking rows, {} build rows)",
            records.len(),
            from_builds,
            records.len() - from_builds,
            ranking_rows,
            build_rows
        );

        records
    }
}

/// Assemble records with the built-in node dictionary
pub fn assemble_records(metadata: &Table, builds: &Table) -> FreshRecords {
    RecordAssembler::default().assemble(metadata, builds)
}

/// Key for a hero known only by its localized name
pub fn synthetic_key(localized_name: &str) -> String {
    let slug: Vec<&str> = localized_name.split_whitespace().collect();
    format!("{}{}", NO_ORIGIN_KEY_PREFIX, slug.join("-"))
}

fn apply_metadata(record: &mut HeroRecord, meta: &MetadataRow<'_>) {
    record.localized_name = meta.localized_name.to_string();
    record.faction = if meta.faction.is_empty() {
        UNKNOWN_FACTION.to_string()
    } else {
        meta.faction.to_string()
    };
    record.awakened = meta.awakened;
}
