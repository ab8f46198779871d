//! Per-cycle folding of attack records into source/destination groups.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{AttackGroup, AttackRecord};

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateOutcome {
    /// One group per distinct (source, destination) pair, in first-seen order.
    pub groups: Vec<AttackGroup>,
    /// Records dropped for lacking a source or destination country code.
    pub discarded: usize,
    /// Records dropped as repeats of an earlier (name, source, destination).
    pub duplicates: usize,
}

type DedupKey = (Option<String>, Option<String>, Option<String>);

fn dedup_key(record: &AttackRecord) -> DedupKey {
    (
        record.attack_name.clone(),
        record.source_country_code.clone(),
        record.destination_country_code.clone(),
    )
}

/// Drops every record whose (name, source, destination) was already seen.
/// The first occurrence wins.
pub fn dedup_attacks(records: Vec<AttackRecord>) -> Vec<AttackRecord> {
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(dedup_key(record)))
        .collect()
}

struct GroupBuilder {
    group: AttackGroup,
    types: BTreeSet<String>,
}

impl GroupBuilder {
    fn start(record: &AttackRecord, src: &str, dst: &str) -> Self {
        Self {
            group: AttackGroup {
                source_country_code: src.to_string(),
                source_country_name: record.source_country_name.clone(),
                source_latitude: record.source_latitude,
                source_longitude: record.source_longitude,
                destination_country_code: dst.to_string(),
                destination_country_name: record.destination_country_name.clone(),
                destination_latitude: record.destination_latitude,
                destination_longitude: record.destination_longitude,
                attack_count: 0,
                attack_types: Vec::new(),
                timestamp: record.timestamp.clone(),
            },
            types: BTreeSet::new(),
        }
    }

    fn add(&mut self, record: &AttackRecord) {
        self.group.attack_count = self.group.attack_count.saturating_add(record.effective_count());
        if let Some(kind) = &record.attack_type {
            self.types.insert(kind.clone());
        }
    }

    fn finish(mut self) -> AttackGroup {
        self.group.attack_types = self.types.into_iter().collect();
        self.group
    }
}

/// Filters, de-duplicates and groups one cycle of attack records.
///
/// Identical (name, source, destination) reports are counted once even when
/// several vendors send them; distinct attack names on the same pair add up.
/// Missing or zero counts contribute one attack.
pub fn aggregate_attacks(records: Vec<AttackRecord>) -> AggregateOutcome {
    let total = records.len();
    let complete: Vec<AttackRecord> = records
        .into_iter()
        .filter(|r| r.country_pair().is_some())
        .collect();
    let discarded = total - complete.len();

    let unique = dedup_attacks(complete);
    let duplicates = total - discarded - unique.len();

    let mut order: Vec<(String, String)> = Vec::new();
    let mut builders: HashMap<(String, String), GroupBuilder> = HashMap::new();
    for record in &unique {
        let Some((src, dst)) = record.country_pair() else {
            continue;
        };
        let key = (src.to_string(), dst.to_string());
        let builder = builders.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            GroupBuilder::start(record, src, dst)
        });
        builder.add(record);
    }

    let groups = order
        .into_iter()
        .filter_map(|key| builders.remove(&key))
        .map(GroupBuilder::finish)
        .collect();

    AggregateOutcome {
        groups,
        discarded,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attack(name: &str, src: Option<&str>, dst: Option<&str>, count: Option<u64>, kind: Option<&str>) -> AttackRecord {
        AttackRecord {
            attack_name: Some(name.to_string()),
            attack_type: kind.map(str::to_string),
            attack_count: count,
            source_country_code: src.map(str::to_string),
            destination_country_code: dst.map(str::to_string),
            timestamp: format!("ts-{}", name),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_reports_are_not_summed() {
        let records = vec![
            attack("X", Some("US"), Some("RU"), Some(3), Some("exploit")),
            attack("X", Some("US"), Some("RU"), None, Some("scan")),
        ];
        let outcome = aggregate_attacks(records);
        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.key(), ("US", "RU"));
        assert_eq!(group.attack_count, 3);
        assert_eq!(group.attack_types, vec!["exploit"]);
        assert_eq!(outcome.duplicates, 1);
    }

    #[test]
    fn test_distinct_names_on_a_pair_add_up() {
        let records = vec![
            attack("A", Some("CN"), Some("US"), Some(2), Some("rce")),
            attack("B", Some("CN"), Some("US"), Some(0), Some("dos")),
            attack("C", Some("CN"), Some("US"), None, Some("rce")),
            attack("D", Some("BR"), Some("US"), Some(5), None),
        ];
        let outcome = aggregate_attacks(records);
        assert_eq!(outcome.groups.len(), 2);
        assert_eq!(outcome.groups[0].key(), ("CN", "US"));
        assert_eq!(outcome.groups[0].attack_count, 4);
        assert_eq!(outcome.groups[0].attack_types, vec!["dos", "rce"]);
        assert_eq!(outcome.groups[0].timestamp, "ts-A");
        assert_eq!(outcome.groups[1].attack_count, 5);
        assert!(outcome.groups[1].attack_types.is_empty());
    }

    #[test]
    fn test_records_missing_a_country_are_discarded() {
        let records = vec![
            attack("A", None, Some("US"), Some(1), None),
            attack("B", Some("US"), None, Some(1), None),
            attack("C", Some(""), Some("US"), Some(1), None),
            attack("D", Some("FR"), Some("US"), Some(1), None),
        ];
        let outcome = aggregate_attacks(records);
        assert_eq!(outcome.discarded, 3);
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].key(), ("FR", "US"));
    }

    #[test]
    fn test_empty_cycle() {
        assert_eq!(aggregate_attacks(Vec::new()), AggregateOutcome::default());
    }

    #[test]
    fn test_dedup_attacks_keeps_first() {
        let records = vec![
            attack("X", Some("US"), Some("RU"), Some(1), Some("first")),
            attack("Y", Some("US"), Some("RU"), Some(1), None),
            attack("X", Some("US"), Some("RU"), Some(9), Some("second")),
        ];
        let unique = dedup_attacks(records);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].attack_type.as_deref(), Some("first"));
    }

    use proptest::prelude::*;

    fn arb_record() -> impl Strategy<Value = AttackRecord> {
        (
            "[A-D]",
            proptest::option::weighted(0.9, "(US|RU|CN|DE)"),
            proptest::option::weighted(0.9, "(US|RU|CN|DE)"),
            proptest::option::of(0u64..5),
            proptest::option::of("(rce|dos|scan)"),
        )
            .prop_map(|(name, src, dst, count, kind)| AttackRecord {
                attack_name: Some(name),
                attack_type: kind,
                attack_count: count,
                source_country_code: src,
                destination_country_code: dst,
                timestamp: "2024-01-01T00:00:00".to_string(),
                ..Default::default()
            })
    }

    /// Groups keyed by pair, ignoring group order.
    fn by_pair(outcome: &AggregateOutcome) -> HashMap<(String, String), (u64, Vec<String>)> {
        outcome
            .groups
            .iter()
            .map(|g| {
                (
                    (g.source_country_code.clone(), g.destination_country_code.clone()),
                    (g.attack_count, g.attack_types.clone()),
                )
            })
            .collect()
    }

    proptest! {
        #[test]
        fn test_incomplete_records_never_reach_groups(records in proptest::collection::vec(arb_record(), 0..40)) {
            let outcome = aggregate_attacks(records.clone());
            let incomplete = records.iter().filter(|r| r.country_pair().is_none()).count();
            prop_assert_eq!(outcome.discarded, incomplete);
            for group in &outcome.groups {
                prop_assert!(!group.source_country_code.is_empty());
                prop_assert!(!group.destination_country_code.is_empty());
            }
        }

        #[test]
        fn test_grouping_ignores_input_order(
            (records, shuffled) in proptest::collection::vec(arb_record(), 0..40)
                .prop_flat_map(|records| {
                    // Deduplicate first so "first occurrence" does not depend on order.
                    let unique = dedup_attacks(records);
                    (Just(unique.clone()), Just(unique).prop_shuffle())
                })
        ) {
            let a = aggregate_attacks(records);
            let b = aggregate_attacks(shuffled);
            prop_assert_eq!(by_pair(&a), by_pair(&b));
        }

        #[test]
        fn test_dedup_is_a_fixed_point(records in proptest::collection::vec(arb_record(), 0..40)) {
            let once = dedup_attacks(records);
            let twice = dedup_attacks(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
