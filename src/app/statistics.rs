//! End-of-run statistics.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{CollectionStats, EventKind};

/// Logs every non-zero collection counter.
pub fn print_collection_statistics(stats: &CollectionStats) {
    let total = stats.total();
    if total == 0 {
        info!("No collection events recorded");
        return;
    }
    info!("Collection events ({} total):", total);
    for kind in EventKind::iter() {
        let count = stats.get(kind);
        if count > 0 {
            info!("   {}: {}", kind.as_str(), count);
        }
    }
}
