//! Malicious-IP reputation lists.

use std::sync::Arc;

use anyhow::Context;
use futures::future::join_all;
use log::info;

use super::Collector;
use crate::aggregate::dedup_ips;
use crate::config::Config;
use crate::error_handling::{CollectionStats, EventKind};
use crate::fetch::{RetryPolicy, RetryingFetcher};
use crate::lookup::Lookups;
use crate::models::{Domain, MaliciousIpRecord};
use crate::sources::fetch_ip_source;

pub struct IpCollector {
    config: Arc<Config>,
    lookups: Lookups,
    stats: Arc<CollectionStats>,
    fetcher: Option<RetryingFetcher>,
}

impl IpCollector {
    pub fn new(config: Arc<Config>, lookups: Lookups, stats: Arc<CollectionStats>) -> Self {
        Self {
            config,
            lookups,
            stats,
            fetcher: None,
        }
    }
}

impl Collector for IpCollector {
    type Record = MaliciousIpRecord;

    fn name(&self) -> &'static str {
        Domain::MaliciousIp.as_str()
    }

    async fn open(&mut self, client: reqwest::Client) -> anyhow::Result<()> {
        let retries = self.config.settings(Domain::MaliciousIp).max_retries;
        self.fetcher = Some(RetryingFetcher::new(
            client,
            RetryPolicy::new(retries),
            self.stats.clone(),
        ));
        Ok(())
    }

    /// Every configured list, merged in configured order.
    async fn collect(&mut self) -> anyhow::Result<Vec<MaliciousIpRecord>> {
        let fetcher = self.fetcher.as_ref().context("ip session is not open")?;
        let locator = &*self.lookups.locator;
        let endpoints = &self.config.endpoints;
        let lists = join_all(
            self.config
                .ip_sources
                .iter()
                .map(|source| fetch_ip_source(*source, fetcher, endpoints, locator)),
        )
        .await;

        let merged: Vec<MaliciousIpRecord> = lists.into_iter().flatten().collect();
        let total = merged.len();
        let unique = dedup_ips(merged);
        self.stats
            .add(EventKind::DuplicateRecord, total - unique.len());
        info!(
            "{}: {} unique addresses from {} lists",
            self.name(),
            unique.len(),
            self.config.ip_sources.len()
        );
        Ok(unique)
    }

    async fn close(&mut self) {
        self.fetcher = None;
    }
}
