//! The retrying HTTP fetcher shared by every polled source.

use std::sync::Arc;

use log::{error, warn};
use reqwest::header::{HeaderName, USER_AGENT};
use serde_json::Value;

use super::retry::{run_with_retry, RetryPolicy};
use super::sleeper::{Sleeper, TokioSleeper};
use crate::config::{random_user_agent, HTTP_STATUS_FORBIDDEN, HTTP_STATUS_TOO_MANY_REQUESTS};
use crate::error_handling::{CollectionStats, EventKind, FetchError};

/// Performs GET requests with bounded retries and rate-limit-aware backoff.
///
/// Failures never escape: every fetch returns `None` once the policy gives up,
/// and the reason is logged and counted. Cloning is cheap and shares the
/// underlying connection pool.
#[derive(Clone)]
pub struct RetryingFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    stats: Arc<CollectionStats>,
    label: Arc<str>,
}

impl RetryingFetcher {
    pub fn new(client: reqwest::Client, policy: RetryPolicy, stats: Arc<CollectionStats>) -> Self {
        Self {
            client,
            policy,
            sleeper: Arc::new(TokioSleeper),
            stats,
            label: Arc::from("fetch"),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// A fetcher sharing this one's client and policy whose log lines and
    /// failures are attributed to `label`.
    pub fn labeled(&self, label: &str) -> Self {
        Self {
            label: Arc::from(label),
            ..self.clone()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn stats(&self) -> &Arc<CollectionStats> {
        &self.stats
    }

    /// Fetches `url` and decodes the body as JSON.
    ///
    /// `headers` are sent as given; a `User-Agent` among them pins the identity,
    /// otherwise a random one from the pool is used for every attempt.
    pub async fn fetch_json(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(HeaderName, &str)],
    ) -> Option<Value> {
        self.fetch_with(url, params, headers, |body| {
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
        })
        .await
    }

    /// Fetches `url` and returns the body as text.
    pub async fn fetch_text(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(HeaderName, &str)],
    ) -> Option<String> {
        self.fetch_with(url, params, headers, |body| {
            String::from_utf8(body).map_err(|e| FetchError::Decode(e.to_string()))
        })
        .await
    }

    async fn fetch_with<T>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(HeaderName, &str)],
        decode: impl Fn(Vec<u8>) -> Result<T, FetchError>,
    ) -> Option<T> {
        let label = &*self.label;
        let max = self.policy.max_retries;
        let decode = &decode;
        let this = self;
        let result = run_with_retry(
            &self.policy,
            self.sleeper.as_ref(),
            move |_| async move { decode(this.attempt(url, params, headers).await?) },
            |attempt, e| {
                self.stats.increment(e.event_kind());
                match e {
                    FetchError::Throttled(status) => warn!(
                        "{} received {} (attempt {}/{}), backing off",
                        label,
                        status,
                        attempt + 1,
                        max
                    ),
                    FetchError::Decode(msg) => {
                        warn!("{}: undecodable payload from {}: {}", label, url, msg)
                    }
                    other => error!(
                        "{} fetch error (attempt {}/{}): {}",
                        label,
                        attempt + 1,
                        max,
                        other
                    ),
                }
            },
        )
        .await;
        if result.is_none() {
            self.stats.increment(EventKind::SourceUnavailable);
            warn!("{}: no data from {} this cycle", label, url);
        }
        result
    }

    async fn attempt(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(HeaderName, &str)],
    ) -> Result<Vec<u8>, FetchError> {
        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if !headers.iter().any(|(name, _)| *name == USER_AGENT) {
            request = request.header(USER_AGENT, random_user_agent());
        }
        for (name, value) in headers {
            request = request.header(name.clone(), *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        if status == HTTP_STATUS_TOO_MANY_REQUESTS || status == HTTP_STATUS_FORBIDDEN {
            return Err(FetchError::Throttled(status));
        }
        if !response.status().is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
