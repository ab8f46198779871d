//! Per-domain collectors and the session loop that drives them.
//!
//! A [`Collector`] knows how to gather one cycle of records for its domain.
//! A [`CollectorSession`] owns the HTTP client lifecycle, calls the collector
//! on a fixed cadence, survives failed and panicking cycles, and hands every
//! batch to a sink until cancelled.

mod ip;
mod news;
mod session;
mod threat;

use std::future::Future;

use crate::models::Identity;

pub use ip::IpCollector;
pub use news::NewsCollector;
pub use session::CollectorSession;
pub use threat::ThreatCollector;

/// One domain's collection logic.
///
/// `open` is called with a fresh client when the session starts and on every
/// refresh; `collect` runs once per cycle; `close` releases whatever `open`
/// acquired and may be called more than once.
pub trait Collector: Send + 'static {
    type Record: Identity + Send + 'static;

    /// Name used in log lines.
    fn name(&self) -> &'static str;

    fn open(&mut self, client: reqwest::Client) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn collect(&mut self) -> impl Future<Output = anyhow::Result<Vec<Self::Record>>> + Send;

    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
