//! Periodic progress logging.

use std::time::Instant;

use log::info;

use super::output::EmitCounts;
use crate::aggregator::Aggregator;
use crate::models::Domain;

/// Logs how much has been emitted and how much is still queued.
pub fn log_progress(start_time: Instant, counts: EmitCounts, aggregator: &Aggregator) {
    let elapsed = start_time.elapsed().as_secs_f64();
    info!(
        "Emitted {} threat groups, {} malicious IPs, {} news snapshots in {:.0}s ({} groups and {} IPs queued)",
        counts.threat_groups,
        counts.ip_records,
        counts.news_snapshots,
        elapsed,
        aggregator.queued(Domain::Threat),
        aggregator.queued(Domain::MaliciousIp)
    );
}
