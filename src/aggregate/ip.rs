//! Merging reputation lists collected in the same cycle.

use std::collections::HashSet;

use crate::models::MaliciousIpRecord;

/// Keeps the first record per address. Lists are merged in configured order,
/// so an address flagged by several lists keeps the kind of the first one.
pub fn dedup_ips(records: Vec<MaliciousIpRecord>) -> Vec<MaliciousIpRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.ip.clone()))
        .collect()
}
