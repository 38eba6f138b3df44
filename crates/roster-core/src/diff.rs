//! Field-level comparison of stored and fetched hero records

use crate::nodes::EngravingNode;
use crate::record::{BuildVariant, DiffSet, HeroRecord};

/// Compare engraving paths step by step on the original label
pub fn nodes_equal(a: &[EngravingNode], b: &[EngravingNode]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.original == y.original)
}

/// Compare two builds on everything the source sheet defines.
/// Translation state is local and ignored.
pub fn build_equal(a: &BuildVariant, b: &BuildVariant) -> bool {
    a.group == b.group
        && a.priority_comment == b.priority_comment
        && a.si_level == b.si_level
        && a.furniture_level == b.furniture_level
        && a.engraving_level == b.engraving_level
        && a.is_alternative == b.is_alternative
        && nodes_equal(&a.engraving_nodes, &b.engraving_nodes)
}

/// Compare build lists regardless of their order
///
/// Each build must pair off with a distinct build of the other list that
/// has the same group label and is otherwise equal.
pub fn builds_equal(a: &[BuildVariant], b: &[BuildVariant]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut used = vec![false; b.len()];
    for build in a {
        let matched = (0..b.len()).find(|&idx| {
            !used[idx] && b[idx].group == build.group && build_equal(build, &b[idx])
        });
        match matched {
            Some(idx) => used[idx] = true,
            None => return false,
        }
    }
    true
}

/// Collect the fresh value of every tracked field that differs from the
/// stored record
pub fn diff_records(stored: &HeroRecord, fresh: &HeroRecord) -> DiffSet {
    let mut diff = DiffSet::default();

    if stored.origin_name != fresh.origin_name {
        diff.origin_name = Some(fresh.origin_name.clone());
    }
    if stored.localized_name != fresh.localized_name {
        diff.localized_name = Some(fresh.localized_name.clone());
    }
    if stored.faction != fresh.faction {
        diff.faction = Some(fresh.faction.clone());
    }
    if stored.awakened != fresh.awakened {
        diff.awakened = Some(fresh.awakened);
    }
    if stored.tier != fresh.tier {
        diff.tier = Some(fresh.tier);
    }
    if stored.score != fresh.score {
        diff.score = Some(fresh.score);
    }
    if stored.ranking_comment != fresh.ranking_comment {
        diff.ranking_comment = Some(fresh.ranking_comment.clone());
    }
    if !builds_equal(&stored.builds, &fresh.builds) {
        diff.builds = Some(fresh.builds.clone());
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_investment;
    use crate::record::{Tier, TrackedField};

    fn build(group: &str, cell: &str) -> BuildVariant {
        let mut b = decode_investment(cell).remove(0);
        b.group = group.to_string();
        b
    }

    #[test]
    fn test_identical_records_have_no_diff() {
        let record = HeroRecord::linked("k", "k");
        assert!(diff_records(&record, &record.clone()).is_empty());
    }

    #[test]
    fn test_scalar_diffs_hold_fresh_values() {
        let stored = HeroRecord::linked("k", "k");
        let mut fresh = stored.clone();
        fresh.tier = Tier::S;
        fresh.score = 4.0;
        fresh.faction = "Wilder".to_string();

        let diff = diff_records(&stored, &fresh);
        assert_eq!(
            diff.fields(),
            vec![TrackedField::Faction, TrackedField::Tier, TrackedField::Score]
        );
        assert_eq!(diff.tier, Some(Tier::S));
        assert_eq!(diff.score, Some(4.0));
        assert_eq!(diff.faction.as_deref(), Some("Wilder"));
    }

    #[test]
    fn test_local_metadata_not_compared() {
        let stored = HeroRecord::linked("k", "k");
        let mut fresh = stored.clone();
        fresh.hidden = true;
        fresh.user_modified = true;
        fresh.ranking_comment_translated = true;
        assert!(diff_records(&stored, &fresh).is_empty());
    }

    #[test]
    fn test_builds_reordered_are_equal() {
        let a = vec![build("S", "309e60УСК"), build("A", "20e30МУ")];
        let b = vec![build("A", "20e30МУ"), build("S", "309e60УСК")];
        assert!(builds_equal(&a, &b));
    }

    #[test]
    fn test_builds_same_group_reordered_are_equal() {
        let a = decode_investment("30e60/309e80");
        let mut b = a.clone();
        b.reverse();
        assert!(builds_equal(&a, &b));
    }

    #[test]
    fn test_builds_length_mismatch() {
        let a = vec![build("S", "309e60")];
        assert!(!builds_equal(&a, &[]));
    }

    #[test]
    fn test_builds_field_mismatch() {
        let a = vec![build("S", "309e60")];
        let b = vec![build("S", "309e80")];
        assert!(!builds_equal(&a, &b));

        let c = vec![build("A", "309e60")];
        assert!(!builds_equal(&a, &c));
    }

    #[test]
    fn test_builds_duplicates_must_pair_off() {
        let a = vec![build("S", "309e60"), build("S", "309e60")];
        let b = vec![build("S", "309e60"), build("S", "309e80")];
        assert!(!builds_equal(&a, &b));
    }

    #[test]
    fn test_node_order_matters() {
        let a = vec![build("S", "30e60УСК>МУ")];
        let b = vec![build("S", "30e60МУ>УСК")];
        assert!(!builds_equal(&a, &b));
    }

    #[test]
    fn test_node_translation_ignored() {
        let a = vec![build("S", "30e60УСК>МУ")];
        let mut b = a.clone();
        b[0].engraving_nodes[0].translated = "Speed".to_string();
        b[0].engraving_nodes[1].found = false;
        b[0].priority_comment_translated = true;
        assert!(builds_equal(&a, &b));
    }

    #[test]
    fn test_builds_diff_holds_fresh_builds() {
        let stored = HeroRecord::linked("k", "k");
        let mut fresh = stored.clone();
        fresh.builds = vec![build("S", "309e60")];

        let diff = diff_records(&stored, &fresh);
        assert_eq!(diff.fields(), vec![TrackedField::Builds]);
        assert_eq!(diff.builds, Some(fresh.builds.clone()));
    }
}
