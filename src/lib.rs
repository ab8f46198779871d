//! threat_harvest library: live threat-intelligence collection
//!
//! This library polls attack-telemetry vendors, listens to a server-sent
//! event stream, reads security news feeds and malicious-IP reputation lists,
//! normalizes everything into a few record types and serves the result as
//! pull batches or broadcast streams.
//!
//! # Example
//!
//! ```no_run
//! use threat_harvest::{Aggregator, Config, Domain};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     threat_interval_secs: 5.0,
//!     ..Default::default()
//! };
//!
//! let mut aggregator = Aggregator::new(config)?;
//! aggregator.start()?;
//! tokio::time::sleep(std::time::Duration::from_secs(30)).await;
//! for group in aggregator.pull_threats(50) {
//!     println!("{} -> {}: {}", group.source_country_code,
//!              group.destination_country_code, group.attack_count);
//! }
//! aggregator.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! Collection runs on Tokio tasks. [`Aggregator::start`] must be called from
//! within a Tokio runtime.

pub mod aggregate;
mod aggregator;
mod app;
pub mod collector;
pub mod config;
mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod lookup;
pub mod models;
pub mod sources;
pub mod stream;

// Re-export public API
pub use aggregator::Aggregator;
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{CollectionStats, ConfigError, EventKind, FetchError, InitializationError};
pub use models::{
    AttackGroup, AttackRecord, Domain, DomainBatch, IpKind, MaliciousIpRecord, NewsArticle,
};
pub use run::{run_collector, RunReport};

// Internal run module (drives the binary's collect-and-emit loop)
mod run {
    use std::future::Future;
    use std::io::Write;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use log::info;

    use crate::aggregator::Aggregator;
    use crate::app::{log_progress, shutdown_gracefully, BatchEmitter};
    use crate::config::{Config, PROGRESS_LOG_INTERVAL};
    use crate::error_handling::EventKind;

    /// Summary of a finished run.
    #[derive(Debug, Clone)]
    pub struct RunReport {
        /// Attack groups written
        pub threat_groups: usize,
        /// Malicious-IP records written
        pub ip_records: usize,
        /// News snapshots written
        pub news_snapshots: usize,
        /// Events counted across all collectors
        pub events: usize,
        /// Vendor requests that exhausted their retries
        pub unavailable: usize,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Collects until `shutdown` resolves, writing JSON lines to `out`.
    ///
    /// Every `emit_interval_secs` up to `batch_size` threat groups and
    /// malicious IPs are pulled and written, plus the news snapshot whenever
    /// it changes. Progress is logged periodically; on shutdown the sessions
    /// are closed, one last emit drains what is already queued, and the
    /// collection counters are printed.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, the lookups cannot be loaded,
    /// or writing to `out` fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use threat_harvest::{run_collector, Config};
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let report = run_collector(Config::default(), std::io::stdout(), async {
    ///     let _ = tokio::signal::ctrl_c().await;
    /// })
    /// .await?;
    /// println!("{} threat groups", report.threat_groups);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_collector<W, F>(config: Config, out: W, shutdown: F) -> Result<RunReport>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let batch_size = config.batch_size;
        let emit_interval = config.emit_interval();
        let mut aggregator = Aggregator::new(config)?;
        let mut emitter = BatchEmitter::new(out);
        let start_time = Instant::now();

        aggregator.start()?;

        let mut emit_ticker = tokio::time::interval(emit_interval);
        emit_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut progress_ticker = tokio::time::interval(PROGRESS_LOG_INTERVAL);
        progress_ticker.tick().await;
        tokio::pin!(shutdown);

        let outcome: Result<()> = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                _ = emit_ticker.tick() => {
                    if let Err(e) = emitter.emit(&aggregator, batch_size) {
                        break Err(anyhow::Error::new(e).context("Failed to write batch"));
                    }
                }
                _ = progress_ticker.tick() => {
                    log_progress(start_time, emitter.counts(), &aggregator);
                }
            }
        };

        aggregator.close().await;
        let drained = outcome.and_then(|()| {
            emitter
                .emit(&aggregator, batch_size)
                .context("Failed to write final batch")
        });
        shutdown_gracefully(&mut aggregator, start_time, emitter.counts()).await;
        drained?;

        let counts = emitter.counts();
        let stats = aggregator.stats();
        Ok(RunReport {
            threat_groups: counts.threat_groups,
            ip_records: counts.ip_records,
            news_snapshots: counts.news_snapshots,
            events: stats.total(),
            unavailable: stats.get(EventKind::SourceUnavailable),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }
}
