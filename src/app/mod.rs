//! Binary-side helpers: batch output, progress logging, shutdown and
//! statistics printing.

pub mod logging;
pub mod output;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use output::BatchEmitter;
pub use shutdown::shutdown_gracefully;
