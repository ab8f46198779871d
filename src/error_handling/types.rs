//! Error type definitions.
//!
//! This module defines the error enums and the event kinds counted while
//! collecting.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The configured forward proxy was rejected.
    #[error("Proxy configuration error for {url}: {source}")]
    ProxyError {
        url: String,
        #[source]
        source: ReqwestError,
    },

    /// The GeoIP database could not be read or parsed.
    #[error("GeoIP database error: {0}")]
    GeoIpError(String),

    /// The country table could not be read or parsed.
    #[error("Country table error: {0}")]
    CountryTableError(String),
}

/// Configuration values rejected by [`crate::Config::validate`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be a finite, non-negative number of seconds (got {1})")]
    InvalidDuration(&'static str, f64),

    #[error("{0} must allow at least one attempt")]
    ZeroRetries(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("{0} must be at least one second")]
    ZeroInterval(&'static str),

    #[error("request and connect timeouts must be greater than zero")]
    ZeroTimeout,

    #[error("invalid proxy URL: {0}")]
    InvalidProxy(String),

    #[error("invalid news feed '{0}', expected name=url")]
    InvalidNewsFeed(String),
}

/// Why a single request attempt did not produce a payload.
///
/// Internal to the fetch boundary: callers only ever see the absence of data.
#[derive(Error, Debug)]
pub enum FetchError {
    /// 429 or 403: the vendor asked us to slow down.
    #[error("throttled with HTTP {0}")]
    Throttled(u16),

    /// Connection, timeout or body-read failure.
    #[error("transport error: {0}")]
    Transport(#[from] ReqwestError),

    /// Any other non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The body arrived but is not what the adapter expects.
    #[error("undecodable payload: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether another attempt could succeed. A body that does not decode will
    /// not decode any better on the next request.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Decode(_))
    }

    /// The counter this failure is recorded under.
    pub fn event_kind(&self) -> EventKind {
        match self {
            FetchError::Throttled(_) => EventKind::ThrottledResponse,
            FetchError::Transport(_) => EventKind::TransportError,
            FetchError::Status(_) => EventKind::HttpStatusError,
            FetchError::Decode(_) => EventKind::UndecodablePayload,
        }
    }
}

/// Events counted across all collectors.
///
/// Each variant maps onto one class of the collection error taxonomy, plus the
/// housekeeping events (evictions, drops) that keep memory bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum EventKind {
    // Fetch boundary
    ThrottledResponse,
    TransportError,
    HttpStatusError,
    UndecodablePayload,
    SourceUnavailable,
    // Adapters
    MalformedItem,
    InvalidIp,
    // Aggregation
    MissingCountryCode,
    DuplicateRecord,
    // Event stream
    StreamReconnect,
    StreamBufferOverflow,
    // Sessions and delivery
    CycleFailure,
    CyclePanic,
    QueueOverflow,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ThrottledResponse => "Throttled responses (429/403)",
            EventKind::TransportError => "Transport errors",
            EventKind::HttpStatusError => "Unexpected HTTP status",
            EventKind::UndecodablePayload => "Undecodable payloads",
            EventKind::SourceUnavailable => "Source unavailable for a cycle",
            EventKind::MalformedItem => "Malformed vendor items skipped",
            EventKind::InvalidIp => "Invalid IP tokens dropped",
            EventKind::MissingCountryCode => "Records missing a country code",
            EventKind::DuplicateRecord => "Duplicate records dropped",
            EventKind::StreamReconnect => "Event-stream reconnects after error",
            EventKind::StreamBufferOverflow => "Stream records dropped (buffer full)",
            EventKind::CycleFailure => "Collection cycles failed",
            EventKind::CyclePanic => "Collection cycles panicked",
            EventKind::QueueOverflow => "Queued records evicted (queue full)",
        }
    }
}
