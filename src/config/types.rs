//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::*;
use crate::error_handling::ConfigError;
use crate::models::Domain;
use crate::sources::{IpSource, ThreatSource};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// A named RSS/Atom feed, written `name=url` on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsFeed {
    pub name: String,
    pub url: String,
}

impl NewsFeed {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl FromStr for NewsFeed {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, url) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidNewsFeed(s.to_string()))?;
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            return Err(ConfigError::InvalidNewsFeed(s.to_string()));
        }
        Ok(NewsFeed::new(name, url))
    }
}

impl fmt::Display for NewsFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.url)
    }
}

/// Returns the built-in news feeds.
pub fn default_news_feeds() -> Vec<NewsFeed> {
    DEFAULT_NEWS_FEEDS
        .iter()
        .map(|(name, url)| NewsFeed::new(*name, *url))
        .collect()
}

/// Upstream URLs for every vendor adapter.
///
/// Not exposed on the command line; tests point these at local mock servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoints {
    pub fortiguard: String,
    pub checkpoint: String,
    pub radware: String,
    pub alienvault: String,
    pub bd_banlist: String,
    pub fraudguard: String,
    pub talos: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            fortiguard: FORTIGUARD_URL.to_string(),
            checkpoint: CHECKPOINT_URL.to_string(),
            radware: RADWARE_URL.to_string(),
            alienvault: ALIENVAULT_URL.to_string(),
            bd_banlist: BD_BANLIST_URL.to_string(),
            fraudguard: FRAUDGUARD_URL.to_string(),
            talos: TALOS_URL.to_string(),
        }
    }
}

/// Poll cadence and retry budget of one domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainSettings {
    pub interval: Duration,
    pub max_retries: u32,
}

/// Collector configuration.
///
/// Parsed from the command line (and environment) by the binary, or built
/// programmatically from [`Config::default`] by library users and tests.
///
/// # Examples
///
/// ```no_run
/// use threat_harvest::Config;
///
/// let config = Config {
///     threat_interval_secs: 5.0,
///     proxy: Some("http://127.0.0.1:8080".to_string()),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "threat_harvest",
    about = "Collects live attack telemetry, security news and malicious-IP feeds."
)]
pub struct Config {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Forward proxy for every outbound request
    #[arg(long, env = "HTTP_PROXY")]
    pub proxy: Option<String>,

    /// Seconds between attack-telemetry cycles
    #[arg(long, default_value_t = DEFAULT_THREAT_INTERVAL_SECS)]
    pub threat_interval_secs: f64,

    /// Seconds between news cycles
    #[arg(long, default_value_t = DEFAULT_NEWS_INTERVAL_SECS)]
    pub news_interval_secs: f64,

    /// Seconds between malicious-IP cycles
    #[arg(long, default_value_t = DEFAULT_IP_INTERVAL_SECS)]
    pub ip_interval_secs: f64,

    /// Attempts per request for attack-telemetry sources
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub threat_max_retries: u32,

    /// Attempts per request for news feeds
    #[arg(long, default_value_t = DEFAULT_NEWS_MAX_RETRIES)]
    pub news_max_retries: u32,

    /// Attempts per request for reputation lists
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub ip_max_retries: u32,

    /// MaxMind GeoLite2-City database used to place malicious IPs
    ///
    /// When missing or unreadable, IP coordinates are left empty.
    #[arg(long, env = "GEOLITE2_DB_PATH")]
    pub geoip: Option<PathBuf>,

    /// JSON file overriding the built-in country table
    ///
    /// Format: `{"US": {"name": "United States", "lat": 39.8, "lon": -98.5}, ...}`
    #[arg(long)]
    pub country_table: Option<PathBuf>,

    /// Attack-telemetry vendors to poll
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = ThreatSource::all()
    )]
    pub threat_sources: Vec<ThreatSource>,

    /// Reputation lists to poll
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = IpSource::all()
    )]
    pub ip_sources: Vec<IpSource>,

    /// News feed as `name=url` (repeatable)
    #[arg(long = "news-feed", default_values_t = default_news_feeds())]
    pub news_feeds: Vec<NewsFeed>,

    /// Seconds after which a session rebuilds its HTTP client
    #[arg(long, default_value_t = DEFAULT_SESSION_REFRESH_SECS)]
    pub session_refresh_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Connect timeout for the event-stream source in seconds
    #[arg(long, default_value_t = DEFAULT_STREAM_CONNECT_TIMEOUT_SECS)]
    pub stream_connect_timeout_secs: u64,

    /// Seconds each event-stream connection is kept open
    #[arg(long, default_value_t = DEFAULT_STREAM_WINDOW_SECS)]
    pub stream_window_secs: f64,

    /// Seconds to wait after a failed event-stream connection
    #[arg(long, default_value_t = DEFAULT_STREAM_COOLDOWN_SECS)]
    pub stream_cooldown_secs: f64,

    /// Stream records buffered between two threat cycles
    #[arg(long, default_value_t = DEFAULT_STREAM_BUFFER_CAPACITY)]
    pub stream_buffer_capacity: usize,

    /// Records held per delivery queue before the oldest are evicted
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Records pulled per domain on each emit tick (binary only)
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Seconds between emit ticks (binary only)
    #[arg(long, default_value_t = DEFAULT_EMIT_INTERVAL_SECS)]
    pub emit_interval_secs: f64,

    /// Vendor URLs
    #[arg(skip)]
    pub endpoints: SourceEndpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            proxy: None,
            threat_interval_secs: DEFAULT_THREAT_INTERVAL_SECS,
            news_interval_secs: DEFAULT_NEWS_INTERVAL_SECS,
            ip_interval_secs: DEFAULT_IP_INTERVAL_SECS,
            threat_max_retries: DEFAULT_MAX_RETRIES,
            news_max_retries: DEFAULT_NEWS_MAX_RETRIES,
            ip_max_retries: DEFAULT_MAX_RETRIES,
            geoip: None,
            country_table: None,
            threat_sources: ThreatSource::all(),
            ip_sources: IpSource::all(),
            news_feeds: default_news_feeds(),
            session_refresh_secs: DEFAULT_SESSION_REFRESH_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            stream_connect_timeout_secs: DEFAULT_STREAM_CONNECT_TIMEOUT_SECS,
            stream_window_secs: DEFAULT_STREAM_WINDOW_SECS,
            stream_cooldown_secs: DEFAULT_STREAM_COOLDOWN_SECS,
            stream_buffer_capacity: DEFAULT_STREAM_BUFFER_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            emit_interval_secs: DEFAULT_EMIT_INTERVAL_SECS,
            endpoints: SourceEndpoints::default(),
        }
    }
}

impl Config {
    /// Checks the configuration for values the collectors cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, secs) in [
            ("threat-interval-secs", self.threat_interval_secs),
            ("news-interval-secs", self.news_interval_secs),
            ("ip-interval-secs", self.ip_interval_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::InvalidDuration(name, secs));
            }
        }
        for (name, secs) in [
            ("stream-window-secs", self.stream_window_secs),
            ("stream-cooldown-secs", self.stream_cooldown_secs),
            ("emit-interval-secs", self.emit_interval_secs),
        ] {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::InvalidDuration(name, secs));
            }
        }
        for (name, retries) in [
            ("threat-max-retries", self.threat_max_retries),
            ("news-max-retries", self.news_max_retries),
            ("ip-max-retries", self.ip_max_retries),
        ] {
            if retries == 0 {
                return Err(ConfigError::ZeroRetries(name));
            }
        }
        for (name, value) in [
            ("stream-buffer-capacity", self.stream_buffer_capacity),
            ("queue-capacity", self.queue_capacity),
            ("batch-size", self.batch_size),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity(name));
            }
        }
        if self.session_refresh_secs == 0 {
            return Err(ConfigError::ZeroInterval("session-refresh-secs"));
        }
        if self.request_timeout_secs == 0 || self.stream_connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(proxy) = &self.proxy {
            reqwest::Url::parse(proxy).map_err(|_| ConfigError::InvalidProxy(proxy.clone()))?;
        }
        if let Some(feed) = self.news_feeds.iter().find(|f| f.name.trim().is_empty()) {
            return Err(ConfigError::InvalidNewsFeed(feed.to_string()));
        }
        Ok(())
    }

    /// Returns the poll cadence and retry budget for `domain`.
    pub fn settings(&self, domain: Domain) -> DomainSettings {
        let (secs, max_retries) = match domain {
            Domain::Threat => (self.threat_interval_secs, self.threat_max_retries),
            Domain::News => (self.news_interval_secs, self.news_max_retries),
            Domain::MaliciousIp => (self.ip_interval_secs, self.ip_max_retries),
        };
        DomainSettings {
            interval: Duration::from_secs_f64(secs.max(0.0)),
            max_retries,
        }
    }

    pub fn session_refresh(&self) -> Duration {
        Duration::from_secs(self.session_refresh_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_connect_timeout_secs)
    }

    pub fn stream_window(&self) -> Duration {
        Duration::from_secs_f64(self.stream_window_secs)
    }

    pub fn stream_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.stream_cooldown_secs)
    }

    pub fn emit_interval(&self) -> Duration {
        Duration::from_secs_f64(self.emit_interval_secs.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threat_sources.len(), 3);
        assert_eq!(config.ip_sources.len(), 4);
        assert_eq!(config.news_feeds.len(), 3);
    }

    #[test]
    fn test_domain_settings() {
        let config = Config::default();
        let threat = config.settings(Domain::Threat);
        assert_eq!(threat.interval, Duration::from_secs(10));
        assert_eq!(threat.max_retries, 5);
        assert_eq!(config.settings(Domain::News).max_retries, 3);
        assert_eq!(
            config.settings(Domain::MaliciousIp).interval,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let config = Config {
            news_max_retries: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroRetries("news-max-retries"))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_session_refresh() {
        let config = Config {
            session_refresh_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval("session-refresh-secs"))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_proxy() {
        let config = Config {
            proxy: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProxy(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_window() {
        let config = Config {
            stream_window_secs: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            threat_interval_secs: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_news_feed_parsing() {
        let feed: NewsFeed = "darkreading=https://www.darkreading.com/rss.xml"
            .parse()
            .unwrap();
        assert_eq!(feed.name, "darkreading");
        assert_eq!(feed.url, "https://www.darkreading.com/rss.xml");
        assert_eq!(
            feed.to_string(),
            "darkreading=https://www.darkreading.com/rss.xml"
        );

        assert!("no-separator".parse::<NewsFeed>().is_err());
        assert!("=https://example.com".parse::<NewsFeed>().is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let config = Config::try_parse_from([
            "threat_harvest",
            "--threat-sources",
            "radware,checkpoint",
            "--ip-sources",
            "talos",
            "--news-feed",
            "a=https://a.example/feed",
            "--threat-interval-secs",
            "2.5",
        ])
        .unwrap();
        assert_eq!(
            config.threat_sources,
            vec![ThreatSource::Radware, ThreatSource::Checkpoint]
        );
        assert_eq!(config.ip_sources, vec![IpSource::Talos]);
        assert_eq!(
            config.news_feeds,
            vec![NewsFeed::new("a", "https://a.example/feed")]
        );
        assert_eq!(
            config.settings(Domain::Threat).interval,
            Duration::from_millis(2500)
        );
    }
}
