//! Three-way merge of freshly assembled records into the stored roster
//!
//! The stored roster mixes source-backed heroes with heroes the user added
//! by hand. Reconciling keeps the stored values of source-backed heroes and
//! records where the source now disagrees, adopts a hand-added hero into a
//! source identity when their localized names match, and marks heroes that
//! vanished from the source instead of deleting them.

use crate::assembler::FreshRecords;
use crate::diff::diff_records;
use crate::record::{HeroRecord, Lineage, PortraitStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Counts of what a reconciliation did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Source-backed heroes merged with their stored record
    pub merged: usize,
    /// Heroes seen for the first time
    pub created: usize,
    /// Hand-added heroes adopted into a source identity: (old key, new key)
    pub promoted: Vec<(String, String)>,
    /// Source-backed heroes absent from the fetch
    pub removed: usize,
    /// Hand-added heroes carried over unchanged
    pub local_only: usize,
    /// Merged heroes whose stored values differ from the source
    pub with_differences: usize,
}

impl ReconcileReport {
    /// Total number of records in the next generation
    pub fn total(&self) -> usize {
        self.merged + self.created + self.promoted.len() + self.removed + self.local_only
    }
}

/// The next generation of records plus a summary
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub records: Vec<HeroRecord>,
    pub report: ReconcileReport,
}

/// Reconcile `fresh` source records against the `previous` roster
///
/// Pure: the result depends on the inputs only. Output order is the fresh
/// records in key order, then hand-added heroes, then removed heroes, the
/// latter two in their previous order.
///
/// When several hand-added heroes could be promoted into the same source
/// hero, the first one in `previous` order wins and the rest stay local.
pub fn reconcile(fresh: &FreshRecords, previous: &[HeroRecord]) -> Reconciliation {
    let linked: HashMap<&str, &HeroRecord> = previous
        .iter()
        .filter(|r| r.lineage.is_linked())
        .map(|r| (r.key.as_str(), r))
        .collect();
    let local: Vec<&HeroRecord> = previous.iter().filter(|r| r.is_local_only()).collect();

    let mut consumed: HashSet<&str> = HashSet::new();
    let mut report = ReconcileReport::default();
    let mut records = Vec::with_capacity(fresh.len() + previous.len());

    for (key, source) in fresh {
        if let Some(stored) = linked.get(key.as_str()) {
            let merged = merge_linked(stored, source);
            if merged.diff.is_some() {
                report.with_differences += 1;
            }
            report.merged += 1;
            records.push(merged);
            continue;
        }

        let candidate = source.promotable_name().and_then(|wanted| {
            let wanted = wanted.to_lowercase();
            local.iter().copied().find(|r| {
                !consumed.contains(r.key.as_str())
                    && r.promotable_name().map(str::to_lowercase).as_deref() == Some(wanted.as_str())
            })
        });

        match candidate {
            Some(local_record) => {
                consumed.insert(local_record.key.as_str());
                log::info!("promoting '{}' to source hero '{}'", local_record.key, key);
                report
                    .promoted
                    .push((local_record.key.clone(), key.clone()));
                records.push(promote(local_record, source));
            }
            None => {
                report.created += 1;
                records.push(new_linked(source));
            }
        }
    }

    for record in &local {
        if !consumed.contains(record.key.as_str()) {
            report.local_only += 1;
            records.push((*record).clone());
        }
    }

    for record in previous.iter().filter(|r| r.lineage.is_linked()) {
        if !fresh.contains_key(&record.key) {
            if record.lineage == Lineage::Linked {
                log::info!("'{}' is no longer in the source", record.key);
            }
            report.removed += 1;
            records.push(HeroRecord {
                lineage: Lineage::Removed,
                diff: None,
                ..record.clone()
            });
        }
    }

    log::debug!("reconciled {} records: {:?}", records.len(), report);

    Reconciliation { records, report }
}

/// Keep the stored values and local metadata, note where the source differs
fn merge_linked(stored: &HeroRecord, source: &HeroRecord) -> HeroRecord {
    let diff = diff_records(stored, source);
    HeroRecord {
        lineage: Lineage::Linked,
        diff: if diff.is_empty() { None } else { Some(diff) },
        ..stored.clone()
    }
}

/// Adopt every source value under the source key; only the local display
/// state of the hand-added hero survives
fn promote(local: &HeroRecord, source: &HeroRecord) -> HeroRecord {
    HeroRecord {
        hidden: local.hidden,
        user_modified: local.user_modified,
        portrait: local.portrait,
        lineage: Lineage::Linked,
        diff: None,
        ..source.clone()
    }
}

fn new_linked(source: &HeroRecord) -> HeroRecord {
    HeroRecord {
        hidden: false,
        user_modified: false,
        portrait: PortraitStatus::Pending,
        lineage: Lineage::Linked,
        diff: None,
        ..source.clone()
    }
}
