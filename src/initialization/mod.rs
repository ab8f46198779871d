//! Application initialization and resource setup.
//!
//! This module provides:
//! - HTTP clients for polling sessions and for the event-stream consumer
//! - Logger setup (plain or JSON)

mod client;
mod logger;

// Re-export public API
pub use client::{init_session_client, init_stream_client};
pub use logger::init_logger_with;
