//! The poll loop shared by every domain.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::FutureExt;
use log::{debug, error, info};
use rand::Rng;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::Collector;
use crate::models::Identity;
use crate::config::{Config, CYCLE_JITTER_SECS};
use crate::error_handling::{CollectionStats, EventKind};
use crate::initialization::init_session_client;

/// Drives one [`Collector`] until cancelled.
///
/// Owns the per-domain state: the collector itself, the time its client was
/// last rebuilt, and the identities of records delivered since then.
pub struct CollectorSession<C: Collector> {
    collector: C,
    config: Arc<Config>,
    interval: Duration,
    refresh_every: Duration,
    stats: Arc<CollectionStats>,
    seen: HashSet<String>,
    opened_at: Option<Instant>,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

impl<C: Collector> CollectorSession<C> {
    pub fn new(
        collector: C,
        config: Arc<Config>,
        interval: Duration,
        stats: Arc<CollectionStats>,
    ) -> Self {
        let refresh_every = config.session_refresh();
        Self {
            collector,
            config,
            interval,
            refresh_every,
            stats,
            seen: HashSet::new(),
            opened_at: None,
        }
    }

    fn needs_refresh(&self) -> bool {
        match self.opened_at {
            Some(opened) => opened.elapsed() >= self.refresh_every,
            None => true,
        }
    }

    async fn refresh(&mut self) -> anyhow::Result<()> {
        let name = self.collector.name();
        let client = init_session_client(&self.config)
            .with_context(|| format!("{}: failed to build HTTP client", name))?;
        self.collector
            .open(client)
            .await
            .with_context(|| format!("{}: failed to open session", name))?;
        self.opened_at = Some(Instant::now());
        self.seen.clear();
        info!("{}: session opened", name);
        Ok(())
    }

    /// One cycle: refresh when due, then collect. Failures and panics end up
    /// as an empty batch.
    async fn cycle(&mut self) -> Vec<C::Record> {
        let name = self.collector.name();
        if self.needs_refresh() {
            if let Err(e) = self.refresh().await {
                self.stats.increment(EventKind::CycleFailure);
                error!("{:#}", e);
                return Vec::new();
            }
        }

        match AssertUnwindSafe(self.collector.collect()).catch_unwind().await {
            Ok(Ok(records)) => {
                let new = records
                    .iter()
                    .filter(|r| self.seen.insert(r.identity()))
                    .count();
                info!(
                    "{}: collected {} records ({} new this session)",
                    name,
                    records.len(),
                    new
                );
                records
            }
            Ok(Err(e)) => {
                self.stats.increment(EventKind::CycleFailure);
                error!("{}: collection cycle failed: {:#}", name, e);
                Vec::new()
            }
            Err(payload) => {
                self.stats.increment(EventKind::CyclePanic);
                error!(
                    "{}: collection cycle panicked: {}",
                    name,
                    panic_message(payload.as_ref())
                );
                Vec::new()
            }
        }
    }

    fn pause(&self) -> Duration {
        let jitter = rand::rng().random_range(0.0..CYCLE_JITTER_SECS);
        self.interval + Duration::from_secs_f64(jitter)
    }

    /// Runs cycles until `cancel` fires, passing every batch (empty ones
    /// included) to `sink` in completion order. The collector is closed
    /// before returning.
    pub async fn run<S>(mut self, cancel: CancellationToken, mut sink: S)
    where
        S: FnMut(Vec<C::Record>) + Send,
    {
        let name = self.collector.name();
        loop {
            let batch = tokio::select! {
                _ = cancel.cancelled() => break,
                batch = self.cycle() => batch,
            };
            sink(batch);

            let pause = self.pause();
            debug!("{}: next cycle in {:.2}s", name, pause.as_secs_f64());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }
        self.collector.close().await;
        info!("{}: session closed", name);
    }
}
