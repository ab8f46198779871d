//! HTTP client initialization.
//!
//! Each collection session owns one client and rebuilds it on refresh, which
//! rotates the connection pool and the default identity together.

use reqwest::ClientBuilder;

use crate::config::{random_user_agent, Config, POOL_MAX_IDLE_PER_HOST};
use crate::error_handling::InitializationError;

fn with_proxy(
    builder: ClientBuilder,
    config: &Config,
) -> Result<ClientBuilder, InitializationError> {
    match &config.proxy {
        Some(url) => {
            let proxy = reqwest::Proxy::all(url).map_err(|source| InitializationError::ProxyError {
                url: url.clone(),
                source,
            })?;
            Ok(builder.proxy(proxy))
        }
        None => Ok(builder),
    }
}

/// Builds the client a polling session uses for one refresh period.
///
/// Configured with:
/// - the per-request timeout from `config`
/// - a random identity from the User-Agent pool
/// - the configured forward proxy, if any
///
/// # Errors
///
/// Returns [`InitializationError::ProxyError`] when the proxy URL is rejected,
/// or [`InitializationError::HttpClientError`] when the client cannot be built.
pub fn init_session_client(config: &Config) -> Result<reqwest::Client, InitializationError> {
    let builder = ClientBuilder::new()
        .timeout(config.request_timeout())
        .user_agent(random_user_agent())
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST);
    Ok(with_proxy(builder, config)?.build()?)
}

/// Builds the client for the event-stream consumer.
///
/// Only the connect phase is bounded here. A stream connection is expected to
/// stay open, and the consumer enforces its own listen window.
pub fn init_stream_client(config: &Config) -> Result<reqwest::Client, InitializationError> {
    let builder = ClientBuilder::new()
        .connect_timeout(config.stream_connect_timeout())
        .user_agent(random_user_agent());
    Ok(with_proxy(builder, config)?.build()?)
}
