//! Per-cycle folding of collected records.
//!
//! Attack telemetry is grouped by (source, destination) country pair after
//! identical reports from different vendors are collapsed; reputation lists
//! are merged into one address set.

mod ip;
mod threat;

pub use ip::dedup_ips;
pub use threat::{aggregate_attacks, dedup_attacks, AggregateOutcome};
