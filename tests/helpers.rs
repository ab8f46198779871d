// Shared test helpers: fetchers that do not really sleep, and configurations
// pointed at a mock server.

use std::sync::Arc;
use std::time::Duration;

use threat_harvest::config::SourceEndpoints;
use threat_harvest::fetch::{RecordingSleeper, RetryPolicy, RetryingFetcher};
use threat_harvest::{CollectionStats, Config};

/// A fetcher with `max_retries` attempts whose backoff is recorded instead of
/// slept.
#[allow(dead_code)]
pub fn recording_fetcher(
    max_retries: u32,
) -> (RetryingFetcher, Arc<RecordingSleeper>, Arc<CollectionStats>) {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build test client");
    let sleeper = Arc::new(RecordingSleeper::default());
    let stats = Arc::new(CollectionStats::new());
    let fetcher = RetryingFetcher::new(client, RetryPolicy::new(max_retries), stats.clone())
        .with_sleeper(sleeper.clone());
    (fetcher, sleeper, stats)
}

/// Every vendor endpoint under `base`, one path per vendor.
#[allow(dead_code)]
pub fn mock_endpoints(base: &str) -> SourceEndpoints {
    SourceEndpoints {
        fortiguard: format!("{}/fortiguard", base),
        checkpoint: format!("{}/checkpoint", base),
        radware: format!("{}/radware", base),
        alienvault: format!("{}/alienvault", base),
        bd_banlist: format!("{}/banlist", base),
        fraudguard: format!("{}/fraudguard", base),
        talos: format!("{}/talos", base),
    }
}

/// A configuration that polls `base` quickly with a single attempt per
/// request, so failing vendors do not stall the tests.
#[allow(dead_code)]
pub fn fast_config(base: &str) -> Config {
    Config {
        threat_interval_secs: 0.2,
        news_interval_secs: 0.2,
        ip_interval_secs: 0.2,
        threat_max_retries: 1,
        news_max_retries: 1,
        ip_max_retries: 1,
        stream_window_secs: 1.0,
        stream_cooldown_secs: 0.2,
        emit_interval_secs: 0.1,
        request_timeout_secs: 5,
        endpoints: mock_endpoints(base),
        news_feeds: Vec::new(),
        ..Default::default()
    }
}
