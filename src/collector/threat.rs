//! Attack telemetry: polled vendors plus the buffered event stream.

use std::sync::Arc;

use anyhow::Context;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use log::info;
use tokio::sync::mpsc;

use super::Collector;
use crate::aggregate::aggregate_attacks;
use crate::config::Config;
use crate::error_handling::{CollectionStats, EventKind};
use crate::fetch::{RetryPolicy, RetryingFetcher};
use crate::initialization::init_stream_client;
use crate::lookup::Lookups;
use crate::models::{AttackGroup, AttackRecord, Domain};
use crate::sources::{fetch_fortiguard, fetch_radware, ThreatSource};
use crate::stream::{StreamConsumer, StreamSettings};

/// Collects one cycle of attack telemetry and folds it into country-pair
/// groups.
///
/// Streamed sources run in a [`StreamConsumer`] owned by this collector. Its
/// records wait in a bounded channel until the next cycle drains them.
pub struct ThreatCollector {
    config: Arc<Config>,
    lookups: Lookups,
    stats: Arc<CollectionStats>,
    fetcher: Option<RetryingFetcher>,
    consumer: Option<StreamConsumer>,
    handoff_tx: mpsc::Sender<AttackRecord>,
    handoff_rx: mpsc::Receiver<AttackRecord>,
}

impl ThreatCollector {
    pub fn new(config: Arc<Config>, lookups: Lookups, stats: Arc<CollectionStats>) -> Self {
        let (handoff_tx, handoff_rx) = mpsc::channel(config.stream_buffer_capacity.max(1));
        Self {
            config,
            lookups,
            stats,
            fetcher: None,
            consumer: None,
            handoff_tx,
            handoff_rx,
        }
    }

    fn streams_enabled(&self) -> bool {
        self.config.threat_sources.iter().any(|s| s.is_streamed())
    }

    async fn stop_consumer(&mut self) {
        if let Some(mut consumer) = self.consumer.take() {
            consumer.stop().await;
        }
    }

    fn drain_stream(&mut self) -> Vec<AttackRecord> {
        let mut records = Vec::new();
        while let Ok(record) = self.handoff_rx.try_recv() {
            records.push(record);
        }
        records
    }
}

impl Collector for ThreatCollector {
    type Record = AttackGroup;

    fn name(&self) -> &'static str {
        Domain::Threat.as_str()
    }

    async fn open(&mut self, client: reqwest::Client) -> anyhow::Result<()> {
        let retries = self.config.settings(Domain::Threat).max_retries;
        self.fetcher = Some(RetryingFetcher::new(
            client,
            RetryPolicy::new(retries),
            self.stats.clone(),
        ));

        self.stop_consumer().await;
        if self.streams_enabled() {
            let stream_client =
                init_stream_client(&self.config).context("failed to build stream client")?;
            let settings = StreamSettings {
                url: self.config.endpoints.checkpoint.clone(),
                window: self.config.stream_window(),
                cooldown: self.config.stream_cooldown(),
            };
            self.consumer = Some(StreamConsumer::start(
                stream_client,
                settings,
                self.lookups.countries.clone(),
                self.handoff_tx.clone(),
                self.stats.clone(),
            ));
        }
        Ok(())
    }

    async fn collect(&mut self) -> anyhow::Result<Vec<AttackGroup>> {
        let mut records = self.drain_stream();
        let streamed = records.len();

        let fetcher = self
            .fetcher
            .as_ref()
            .context("threat session is not open")?;
        let countries = &*self.lookups.countries;
        let endpoints = &self.config.endpoints;
        let polls: Vec<BoxFuture<'_, Vec<AttackRecord>>> = self
            .config
            .threat_sources
            .iter()
            .filter(|source| !source.is_streamed())
            .map(|source| {
                let fetcher = fetcher.labeled(source.as_str());
                match source {
                    ThreatSource::Fortiguard => async move {
                        fetch_fortiguard(&fetcher, &endpoints.fortiguard, countries).await
                    }
                    .boxed(),
                    ThreatSource::Radware => async move {
                        fetch_radware(&fetcher, &endpoints.radware, countries).await
                    }
                    .boxed(),
                    ThreatSource::Checkpoint => futures::future::ready(Vec::new()).boxed(),
                }
            })
            .collect();
        for batch in join_all(polls).await {
            records.extend(batch);
        }

        let total = records.len();
        let outcome = aggregate_attacks(records);
        self.stats
            .add(EventKind::MissingCountryCode, outcome.discarded);
        self.stats.add(EventKind::DuplicateRecord, outcome.duplicates);
        info!(
            "{}: {} records ({} streamed) folded into {} groups, {} missing a country, {} duplicates",
            self.name(),
            total,
            streamed,
            outcome.groups.len(),
            outcome.discarded,
            outcome.duplicates
        );
        Ok(outcome.groups)
    }

    async fn close(&mut self) {
        self.stop_consumer().await;
        self.fetcher = None;
    }
}
