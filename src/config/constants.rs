//! Configuration constants.
//!
//! This module defines the operational parameters shared by the collectors:
//! timeouts, backoff limits, poll cadences and the vendor endpoints.

use std::time::Duration;

// Poll cadence (seconds, used as CLI defaults)
/// Seconds between attack-telemetry cycles
pub const DEFAULT_THREAT_INTERVAL_SECS: f64 = 10.0;
/// Seconds between news cycles
pub const DEFAULT_NEWS_INTERVAL_SECS: f64 = 300.0;
/// Seconds between malicious-IP cycles
pub const DEFAULT_IP_INTERVAL_SECS: f64 = 60.0;
/// Upper bound of the random jitter added to every inter-cycle sleep
pub const CYCLE_JITTER_SECS: f64 = 0.5;

// Retry strategy
/// Attempts per request for the threat and IP collectors
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Attempts per request for the news collector
pub const DEFAULT_NEWS_MAX_RETRIES: u32 = 3;
/// Upper bound of the random jitter added to each backoff delay
pub const BACKOFF_JITTER_SECS: f64 = 0.5;
/// Ceiling for a single backoff sleep (10 minutes)
///
/// Bounds how long one throttled vendor can stall its collection cycle.
pub const MAX_BACKOFF: Duration = Duration::from_secs(600);

// Session lifecycle
/// Seconds after which a session rebuilds its HTTP client and identity
pub const DEFAULT_SESSION_REFRESH_SECS: u64 = 3600;
/// Per-request timeout for polled sources in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Idle connections kept per host by a session client
pub const POOL_MAX_IDLE_PER_HOST: usize = 50;

// Event stream
/// Connect timeout for the event-stream source in seconds
pub const DEFAULT_STREAM_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Listen window per event-stream connection in seconds
pub const DEFAULT_STREAM_WINDOW_SECS: f64 = 10.0;
/// Pause after a failed event-stream connection in seconds
pub const DEFAULT_STREAM_COOLDOWN_SECS: f64 = 1.0;
/// Pause between two healthy listen windows
pub const STREAM_RECONNECT_PAUSE: Duration = Duration::from_millis(100);
/// Records the stream consumer may buffer before the session drains them
pub const DEFAULT_STREAM_BUFFER_CAPACITY: usize = 10_000;
/// Event name carrying attack telemetry on the stream
pub const TELEMETRY_EVENT: &str = "attack";

// Delivery
/// Records held per domain queue before the oldest are evicted
pub const DEFAULT_QUEUE_CAPACITY: usize = 50_000;
/// Batches retained for slow stream subscribers
pub const STREAM_CHANNEL_CAPACITY: usize = 64;

// Binary output
/// Records pulled per domain on each emit tick
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Seconds between two emit ticks of the binary
pub const DEFAULT_EMIT_INTERVAL_SECS: f64 = 1.0;
/// Interval between progress log lines of the binary
pub const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(60);

// HTTP status codes
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

// Vendor endpoints
pub const FORTIGUARD_URL: &str = "https://fortiguard.fortinet.com/api/threatmap/live/outbreak";
pub const FORTIGUARD_REFERER: &str = "https://fortiguard.fortinet.com/";
pub const CHECKPOINT_URL: &str = "https://threatmap-api.checkpoint.com/ThreatMap/api/feed";
pub const RADWARE_URL: &str = "https://ltm-prod-api.radware.com/map/attacks?limit=20";
pub const ALIENVAULT_URL: &str = "https://reputation.alienvault.com/reputation.unix";
pub const BD_BANLIST_URL: &str = "https://www.binarydefense.com/banlist.txt";
pub const FRAUDGUARD_URL: &str = "https://api.fraudguard.io/landing-page-map";
pub const TALOS_URL: &str = "https://talosintelligence.com/cloud_intel/top_senders_list";

/// Default news feeds as `(name, url)` pairs.
pub const DEFAULT_NEWS_FEEDS: &[(&str, &str)] = &[
    ("hackernews", "https://feeds.feedburner.com/TheHackersNews"),
    ("darkreading", "https://www.darkreading.com/rss.xml"),
    ("420in", "https://the420.in/feed"),
];
