//! Error handling and collection statistics.
//!
//! This module provides:
//! - Error type definitions (initialization, configuration, fetch)
//! - Event kinds for the collection error taxonomy
//! - Thread-safe counters for those events
//!
//! Errors never cross the public batch/stream boundary: throttling and
//! transport failures end at the fetcher, malformed items end at the adapter,
//! and anything else ends at the collection loop. The counters are how those
//! swallowed failures stay visible.

mod stats;
mod types;

// Re-export public API
pub use stats::CollectionStats;
pub use types::{ConfigError, EventKind, FetchError, InitializationError};
