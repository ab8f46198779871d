//! Graceful shutdown handling.

use std::time::Instant;

use super::logging::log_progress;
use super::output::EmitCounts;
use super::statistics::print_collection_statistics;
use crate::aggregator::Aggregator;

/// Stops the collectors, then logs the final progress line and counters.
pub async fn shutdown_gracefully(aggregator: &mut Aggregator, start_time: Instant, counts: EmitCounts) {
    aggregator.close().await;
    log_progress(start_time, counts, aggregator);
    print_collection_statistics(aggregator.stats());
}
