//! External collaborators the collectors depend on.
//!
//! Country names and centroids, IP geolocation, feed parsing and news
//! relevance are plain lookups. Each sits behind a trait so hosts can swap in
//! their own; the defaults here are what the binary runs with.

mod country;
mod feed;
mod geoip;
mod relevance;

use std::sync::Arc;

use regex::Regex;

use crate::config::Config;
use crate::error_handling::InitializationError;

pub use country::{CountryDirectory, CountryTable};
pub use feed::{FeedEntry, FeedParser, SimpleFeedParser};
pub use geoip::{GeoIpLocator, IpLocator, NoopLocator};
pub use relevance::{
    KeywordClassifier, Relevance, RelevanceClassifier, EXCLUDE_TERMS, PRIMARY_KEYWORDS,
    SECONDARY_KEYWORDS,
};

/// Compiles a pattern that is a compile-time constant, panicking with context
/// if it is invalid. A failure here is a programming error.
pub(crate) fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

/// The set of lookups shared by all collectors.
#[derive(Clone)]
pub struct Lookups {
    pub countries: Arc<dyn CountryDirectory>,
    pub locator: Arc<dyn IpLocator>,
    pub feed_parser: Arc<dyn FeedParser>,
    pub relevance: Arc<dyn RelevanceClassifier>,
}

impl Lookups {
    /// Builds the default lookups for `config`.
    ///
    /// A broken country table override is an error. A missing or unreadable
    /// GeoIP database is not: IP coordinates are then left empty.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        let countries = match &config.country_table {
            Some(path) => CountryTable::from_path(path)?,
            None => CountryTable::builtin()?,
        };
        let locator: Arc<dyn IpLocator> = match &config.geoip {
            Some(path) => match GeoIpLocator::open(path) {
                Ok(locator) => Arc::new(locator),
                Err(e) => {
                    log::warn!("{}; IP coordinates will be empty", e);
                    Arc::new(NoopLocator)
                }
            },
            None => {
                log::info!("No GeoIP database configured; IP coordinates will be empty");
                Arc::new(NoopLocator)
            }
        };
        Ok(Self {
            countries: Arc::new(countries),
            locator,
            feed_parser: Arc::new(SimpleFeedParser),
            relevance: Arc::new(KeywordClassifier::default()),
        })
    }

    pub fn with_countries(mut self, countries: Arc<dyn CountryDirectory>) -> Self {
        self.countries = countries;
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn IpLocator>) -> Self {
        self.locator = locator;
        self
    }
}
