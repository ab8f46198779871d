//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, backoff limits, vendor endpoints)
//! - Request identity (User-Agent pool, header values)
//! - CLI option types and validation

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{
    default_news_feeds, Config, DomainSettings, LogFormat, LogLevel, NewsFeed, SourceEndpoints,
};
